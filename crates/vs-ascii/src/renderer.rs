use vs_core::charset::GlyphRamp;
use vs_core::frame::{LuminanceGrid, SampledGrid};

/// Séquence de reset couleur (SGR 0).
pub const RESET: &str = "\x1b[0m";

/// Préfixe d'une couleur foreground truecolor : `ESC[38;2;R;G;Bm`.
const FG_PREFIX: &str = "\x1b[38;2;";

/// Octets max d'une cellule : `ESC[38;2;255;255;255m` + glyphe UTF-8 (4) + `ESC[0m`.
const MAX_CELL_BYTES: usize = 19 + 4 + 4;

/// Rend une frame : un glyphe par cellule, chacun encadré par sa couleur d'origine
/// et un reset, puis `\n` en fin de ligne.
///
/// `out` est vidé puis rempli ; sa capacité est conservée d'un cycle à l'autre.
/// Un reset suit chaque glyphe, même si la cellule suivante a la même couleur.
///
/// # Example
/// ```
/// use vs_core::charset::GlyphRamp;
/// use vs_core::frame::{LuminanceGrid, SampledGrid};
/// use vs_ascii::renderer::render_into;
///
/// let mut grid = SampledGrid::new(1, 1);
/// grid.data.copy_from_slice(&[255, 0, 8]);
/// let lum = LuminanceGrid::new(1, 1);
/// let mut out = String::new();
/// render_into(&lum, &grid, &GlyphRamp::default(), &mut out);
/// assert_eq!(out, "\x1b[38;2;255;0;8m.\x1b[0m\n");
/// ```
pub fn render_into(lum: &LuminanceGrid, colors: &SampledGrid, ramp: &GlyphRamp, out: &mut String) {
    debug_assert_eq!(
        (lum.width, lum.height),
        (colors.width, colors.height),
        "luminance et couleurs désalignées"
    );
    out.clear();
    let width = lum.width.min(colors.width);
    let height = lum.height.min(colors.height);
    out.reserve(width as usize * height as usize * MAX_CELL_BYTES + height as usize);

    for y in 0..height {
        for x in 0..width {
            let (r, g, b) = colors.pixel(x, y);
            push_cell(out, ramp.glyph_for(lum.get(x, y)), r, g, b);
        }
        out.push('\n');
    }
}

/// Allocating convenience around [`render_into`].
#[must_use]
pub fn render(lum: &LuminanceGrid, colors: &SampledGrid, ramp: &GlyphRamp) -> String {
    let mut out = String::new();
    render_into(lum, colors, ramp, &mut out);
    out
}

#[inline(always)]
fn push_cell(out: &mut String, glyph: char, r: u8, g: u8, b: u8) {
    out.push_str(FG_PREFIX);
    push_decimal(out, r);
    out.push(';');
    push_decimal(out, g);
    out.push(';');
    push_decimal(out, b);
    out.push('m');
    out.push(glyph);
    out.push_str(RESET);
}

/// Écrit `v` en décimal sans passer par `fmt` (hot path).
#[inline(always)]
fn push_decimal(out: &mut String, v: u8) {
    if v >= 100 {
        out.push(char::from(b'0' + v / 100));
    }
    if v >= 10 {
        out.push(char::from(b'0' + (v / 10) % 10));
    }
    out.push(char::from(b'0' + v % 10));
}
