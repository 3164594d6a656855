use crate::StampError;
use rustybuzz::{Direction as HbDirection, Face as HbFace, UnicodeBuffer};
use std::collections::BTreeMap;
use std::path::Path;
use ttf_parser::GlyphId;

/// A font program parsed once per batch and shared read-only by all workers.
///
/// Holds the raw bytes (embedded verbatim into each generated document) plus
/// the metrics the PDF font descriptor needs. Faces are re-parsed from the
/// bytes on demand; parsing is cheap and keeps this type self-contained.
#[derive(Debug)]
pub struct StampFont {
    pub(crate) name: String,
    pub(crate) data: Vec<u8>,
    pub(crate) metrics: FontMetrics,
    pub(crate) program_kind: FontProgramKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FontProgramKind {
    TrueType,
    OpenTypeCff,
}

#[derive(Debug, Clone)]
pub(crate) struct FontMetrics {
    pub(crate) ascent: i16,
    pub(crate) descent: i16,
    pub(crate) cap_height: i16,
    pub(crate) italic_angle: i16,
    pub(crate) stem_v: i16,
    pub(crate) bbox: (i16, i16, i16, i16),
    pub(crate) missing_width: u16,
    pub(crate) is_fixed_pitch: bool,
}

/// One name shaped into a glyph run: the glyph ids to show, in visual order,
/// and the glyph->source-text map feeding the /ToUnicode cmap.
#[derive(Debug, Clone, Default)]
pub struct ShapedRun {
    pub(crate) glyphs: Vec<u16>,
    pub(crate) glyph_map: BTreeMap<u16, String>,
}

impl StampFont {
    pub fn parse(data: Vec<u8>) -> Result<Self, StampError> {
        let face = ttf_parser::Face::parse(&data, 0)
            .map_err(|err| StampError::FontEmbed(format!("invalid font program: {}", err)))?;
        let name = font_primary_name(&face).unwrap_or_else(|| "StampFont".to_string());
        let metrics = FontMetrics::from_face(&face);
        let program_kind = if face.tables().cff.is_some() {
            FontProgramKind::OpenTypeCff
        } else {
            FontProgramKind::TrueType
        };
        Ok(Self {
            name,
            data,
            metrics,
            program_kind,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StampError> {
        let data = std::fs::read(path.as_ref())?;
        Self::parse(data)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shape `text` into positioned glyph ids. Gujarati needs real shaping
    /// (conjuncts, matras reorder around consonants), so a plain
    /// codepoint->glyph walk is not an option here.
    pub fn shape(&self, text: &str) -> Result<ShapedRun, StampError> {
        let face = HbFace::from_slice(&self.data, 0)
            .ok_or_else(|| StampError::FontEmbed("font rejected by shaper".to_string()))?;

        let mut buffer = UnicodeBuffer::new();
        buffer.set_direction(detect_direction(text));
        buffer.push_str(text);
        let output = rustybuzz::shape(&face, &[], buffer);

        let infos = output.glyph_infos();
        if infos.is_empty() && !text.is_empty() {
            return Err(StampError::FontEmbed(format!(
                "shaper produced no glyphs for {:?}",
                text
            )));
        }

        // Cluster values are byte offsets into the source text; glyphs sharing
        // a cluster map back to the same source substring.
        let mut cluster_starts: Vec<usize> = infos.iter().map(|i| i.cluster as usize).collect();
        cluster_starts.sort_unstable();
        cluster_starts.dedup();

        let mut glyphs = Vec::with_capacity(infos.len());
        let mut glyph_map: BTreeMap<u16, String> = BTreeMap::new();
        for info in infos {
            let gid = info.glyph_id as u16;
            glyphs.push(gid);
            let start = info.cluster as usize;
            let end = cluster_starts
                .iter()
                .find(|&&c| c > start)
                .copied()
                .unwrap_or(text.len());
            if start <= end && end <= text.len() {
                glyph_map
                    .entry(gid)
                    .or_insert_with(|| text[start..end].to_string());
            }
        }

        Ok(ShapedRun { glyphs, glyph_map })
    }

    /// Horizontal advance for a glyph, scaled to 1000 units per em.
    pub(crate) fn glyph_advance(&self, gid: u16) -> u16 {
        let Ok(face) = ttf_parser::Face::parse(&self.data, 0) else {
            return 0;
        };
        let advance = face.glyph_hor_advance(GlyphId(gid)).unwrap_or(0);
        let units = face.units_per_em().max(1) as i64;
        let scaled = ((advance as i64) * 1000 + (units / 2)) / units;
        scaled.clamp(0, u16::MAX as i64) as u16
    }
}

impl FontMetrics {
    fn from_face(face: &ttf_parser::Face<'_>) -> Self {
        let units_per_em = face.units_per_em().max(1);
        let scale = 1000.0 / units_per_em as f32;

        let ascent = scale_i16(face.ascender(), scale);
        let descent = scale_i16(face.descender(), scale);
        let cap_height = face
            .capital_height()
            .map(|value| scale_i16(value, scale))
            .unwrap_or(ascent);
        let italic_angle = face
            .italic_angle()
            .map(|value| value.round() as i16)
            .unwrap_or(0);
        let bbox = face.global_bounding_box();
        let bbox = (
            scale_i16(bbox.x_min, scale),
            scale_i16(bbox.y_min, scale),
            scale_i16(bbox.x_max, scale),
            scale_i16(bbox.y_max, scale),
        );
        let missing_width = face
            .glyph_index(' ')
            .and_then(|id| face.glyph_hor_advance(id))
            .map(|adv| {
                let scaled = (adv as f32 * scale).round() as i32;
                scaled.clamp(0, u16::MAX as i32) as u16
            })
            .unwrap_or(500);

        Self {
            ascent,
            descent,
            cap_height,
            italic_angle,
            stem_v: 80,
            bbox,
            missing_width,
            is_fixed_pitch: face.is_monospaced(),
        }
    }

    pub(crate) fn flags(&self) -> i64 {
        let mut flags = 32;
        if self.is_fixed_pitch {
            flags |= 1;
        }
        flags
    }
}

fn detect_direction(text: &str) -> HbDirection {
    for ch in text.chars() {
        let code = ch as u32;
        let rtl = matches!(
            code,
            0x0590..=0x08FF | 0xFB1D..=0xFDFF | 0xFE70..=0xFEFF | 0x1EE00..=0x1EEFF
        );
        if rtl {
            return HbDirection::RightToLeft;
        }
    }
    HbDirection::LeftToRight
}

fn scale_i16(value: i16, scale: f32) -> i16 {
    let scaled = (value as f32 * scale).round() as i32;
    scaled.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

fn font_primary_name(face: &ttf_parser::Face<'_>) -> Option<String> {
    use ttf_parser::name::name_id;

    let mut family = None;
    let mut full = None;
    let mut post = None;
    for entry in face.names() {
        let Some(name) = entry.to_string() else {
            continue;
        };
        match entry.name_id {
            name_id::TYPOGRAPHIC_FAMILY | name_id::FAMILY => {
                if family.is_none() {
                    family = Some(name);
                }
            }
            name_id::FULL_NAME => {
                if full.is_none() {
                    full = Some(name);
                }
            }
            name_id::POST_SCRIPT_NAME => {
                if post.is_none() {
                    post = Some(name);
                }
            }
            _ => {}
        }
    }
    post.or(full).or(family)
}
