/// Level palette: the fixed set of cell colours a level image may use.
/// Colours are compared as packed RGBA32 (`R<<24 | G<<16 | B<<8 | A`),
/// exact match only, so cell semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CellKind {
    Empty,   // black
    Terrain, // green
    Spawn,   // white
    Feather, // magenta
    Coin,    // yellow
    Goal,    // red
}

/// Pack an opaque RGB triple the way the palette stores it.
pub const fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    (r as u32) << 24 | (g as u32) << 16 | (b as u32) << 8 | 0xff
}

/// Pack four channels into one RGBA32 value.
pub const fn pack_rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) << 24 | (g as u32) << 16 | (b as u32) << 8 | a as u32
}

/// Split an RGBA32 value into `[r, g, b, a]`.
pub fn channels(rgba: u32) -> [u8; 4] {
    rgba.to_be_bytes()
}

impl CellKind {
    pub const ALL: [CellKind; 6] = [
        CellKind::Empty,
        CellKind::Terrain,
        CellKind::Spawn,
        CellKind::Feather,
        CellKind::Coin,
        CellKind::Goal,
    ];

    pub const fn color(self) -> u32 {
        match self {
            CellKind::Empty => pack_rgb(0, 0, 0),
            CellKind::Terrain => pack_rgb(0, 255, 0),
            CellKind::Spawn => pack_rgb(255, 255, 255),
            CellKind::Feather => pack_rgb(255, 0, 255),
            CellKind::Coin => pack_rgb(255, 255, 0),
            CellKind::Goal => pack_rgb(255, 0, 0),
        }
    }

    /// Exact palette lookup. `None` for any colour outside the palette,
    /// including palette colours with a non-opaque alpha.
    pub fn from_rgba(rgba: u32) -> Option<CellKind> {
        CellKind::ALL.into_iter().find(|k| k.color() == rgba)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_colors_are_distinct() {
        for (i, a) in CellKind::ALL.iter().enumerate() {
            for b in &CellKind::ALL[i + 1..] {
                assert_ne!(a.color(), b.color(), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn lookup_round_trips_every_entry() {
        for kind in CellKind::ALL {
            assert_eq!(CellKind::from_rgba(kind.color()), Some(kind));
        }
    }

    #[test]
    fn terrain_is_pure_green_opaque() {
        assert_eq!(CellKind::Terrain.color(), 0x00ff_00ff);
        assert_eq!(channels(CellKind::Terrain.color()), [0, 255, 0, 255]);
    }

    #[test]
    fn translucent_palette_color_is_unknown() {
        assert_eq!(CellKind::from_rgba(pack_rgba(0, 255, 0, 0x80)), None);
    }

    #[test]
    fn off_palette_color_is_unknown() {
        assert_eq!(CellKind::from_rgba(pack_rgb(0, 254, 0)), None);
    }
}
