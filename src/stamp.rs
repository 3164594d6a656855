use crate::StampError;
use crate::font::{FontProgramKind, ShapedRun, StampFont};
use crate::registry::Point;
use lopdf::{
    Document as LoDocument, Object as LoObject, ObjectId as LoObjectId, Stream as LoStream,
    dictionary,
};
use std::collections::BTreeMap;

/// Resource name under which the stamping font is registered on each page.
const FONT_RESOURCE_NAME: &str = "StampF1";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

/// Draw configuration threaded through the instantiator. The defaults are the
/// production values for the invitation templates: 24pt red.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampStyle {
    pub font_size: f32,
    pub color: Color,
}

impl Default for StampStyle {
    fn default() -> Self {
        Self {
            font_size: 24.0,
            color: Color::rgb(1.0, 0.0, 0.0),
        }
    }
}

/// Stamp `text` onto a fresh copy of the template at each resolved placement.
///
/// The template bytes are shared read-only across a batch; only the parsed
/// document is per-invocation, so generated documents cannot cross-contaminate.
pub fn stamp_document(
    template_bytes: &[u8],
    font: &StampFont,
    text: &str,
    placements: &[(usize, Point)],
    style: &StampStyle,
) -> Result<Vec<u8>, StampError> {
    let mut doc = LoDocument::load_mem(template_bytes)
        .map_err(|err| StampError::TemplateCorrupt(err.to_string()))?;
    if doc.is_encrypted() {
        return Err(StampError::TemplateCorrupt(
            "template PDF is encrypted".to_string(),
        ));
    }

    let page_ids: Vec<LoObjectId> = doc.get_pages().values().copied().collect();
    for (page, _) in placements {
        if *page >= page_ids.len() {
            return Err(StampError::PageOutOfRange {
                page: *page,
                page_count: page_ids.len(),
            });
        }
    }

    let run = font.shape(text)?;
    let font_ref = embed_stamp_font(&mut doc, font, &run);

    for (page, point) in placements {
        let page_id = page_ids[*page];
        register_page_font(&mut doc, page_id, font_ref)?;
        let content = draw_text_content(&run, *point, style);
        doc.add_page_contents(page_id, content)
            .map_err(|err| StampError::TemplateCorrupt(err.to_string()))?;
    }

    doc.prune_objects();
    doc.renumber_objects();
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut std::io::Cursor::new(&mut out))?;
    Ok(out)
}

/// Embed the font as a Type0 / CIDFontType2 / Identity-H object graph:
/// font program, descriptor, CID font with /W widths for the used glyphs,
/// and a /ToUnicode bfchar cmap so stamped names stay copyable.
fn embed_stamp_font(doc: &mut LoDocument, font: &StampFont, run: &ShapedRun) -> LoObjectId {
    let base_name = sanitize_font_name(font.name());
    let metrics = &font.metrics;

    let mut file_dict = dictionary! {
        "Length1" => font.data.len() as i64,
    };
    if font.program_kind == FontProgramKind::OpenTypeCff {
        file_dict.set("Subtype", LoObject::Name(b"OpenType".to_vec()));
    }
    let font_file_id = doc.add_object(LoStream::new(file_dict, font.data.clone()));

    let font_file_key = match font.program_kind {
        FontProgramKind::OpenTypeCff => "FontFile3",
        FontProgramKind::TrueType => "FontFile2",
    };
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => LoObject::Name(base_name.clone().into_bytes()),
        "Flags" => metrics.flags(),
        "FontBBox" => vec![
            LoObject::Integer(metrics.bbox.0 as i64),
            LoObject::Integer(metrics.bbox.1 as i64),
            LoObject::Integer(metrics.bbox.2 as i64),
            LoObject::Integer(metrics.bbox.3 as i64),
        ],
        "ItalicAngle" => metrics.italic_angle as i64,
        "Ascent" => metrics.ascent as i64,
        "Descent" => metrics.descent as i64,
        "CapHeight" => metrics.cap_height as i64,
        "StemV" => metrics.stem_v as i64,
        "MissingWidth" => metrics.missing_width as i64,
        font_file_key => font_file_id,
    });

    let mut widths: Vec<LoObject> = Vec::with_capacity(run.glyph_map.len() * 2);
    for gid in run.glyph_map.keys() {
        let advance = font.glyph_advance(*gid);
        let width = if advance > 0 {
            advance
        } else {
            metrics.missing_width
        };
        widths.push(LoObject::Integer(*gid as i64));
        widths.push(LoObject::Array(vec![LoObject::Integer(width as i64)]));
    }

    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => LoObject::Name(base_name.clone().into_bytes()),
        "CIDSystemInfo" => dictionary! {
            "Registry" => LoObject::string_literal("Adobe"),
            "Ordering" => LoObject::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "W" => LoObject::Array(widths),
        "CIDToGIDMap" => "Identity",
    });

    let to_unicode_id = doc.add_object(LoStream::new(
        dictionary! {},
        to_unicode_cmap(&run.glyph_map).into_bytes(),
    ));

    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => LoObject::Name(base_name.into_bytes()),
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![LoObject::Reference(cid_font_id)],
        "ToUnicode" => to_unicode_id,
    })
}

/// Make the stamping font reachable from a page's /Resources /Font dictionary,
/// preserving whatever resources the template page already carries.
fn register_page_font(
    doc: &mut LoDocument,
    page_id: LoObjectId,
    font_ref: LoObjectId,
) -> Result<(), StampError> {
    let page_dict = doc
        .get_object(page_id)
        .and_then(LoObject::as_dict)
        .map_err(|err| StampError::TemplateCorrupt(err.to_string()))?
        .clone();

    let mut resources = page_resources_dict(&page_dict, doc);
    let mut fonts = page_font_dict(&resources, doc);
    fonts.set(
        FONT_RESOURCE_NAME.as_bytes().to_vec(),
        LoObject::Reference(font_ref),
    );
    resources.set("Font", LoObject::Dictionary(fonts));

    let page_mut = doc
        .get_object_mut(page_id)
        .and_then(LoObject::as_dict_mut)
        .map_err(|err| StampError::TemplateCorrupt(err.to_string()))?;
    page_mut.set("Resources", LoObject::Dictionary(resources));
    Ok(())
}

fn page_resources_dict(page: &lopdf::Dictionary, doc: &LoDocument) -> lopdf::Dictionary {
    match page.get(b"Resources") {
        Ok(LoObject::Dictionary(d)) => d.clone(),
        Ok(LoObject::Reference(id)) => doc
            .get_object(*id)
            .ok()
            .and_then(|o| o.as_dict().ok())
            .cloned()
            .unwrap_or_default(),
        _ => lopdf::Dictionary::new(),
    }
}

fn page_font_dict(resources: &lopdf::Dictionary, doc: &LoDocument) -> lopdf::Dictionary {
    match resources.get(b"Font") {
        Ok(LoObject::Dictionary(d)) => d.clone(),
        Ok(LoObject::Reference(id)) => doc
            .get_object(*id)
            .ok()
            .and_then(|o| o.as_dict().ok())
            .cloned()
            .unwrap_or_default(),
        _ => lopdf::Dictionary::new(),
    }
}

fn draw_text_content(run: &ShapedRun, point: Point, style: &StampStyle) -> Vec<u8> {
    let mut hex = String::with_capacity(run.glyphs.len() * 4 + 2);
    hex.push('<');
    for gid in &run.glyphs {
        hex.push_str(&format!("{:04X}", gid));
    }
    hex.push('>');
    format!(
        "q BT /{} {} Tf {} {} {} rg {} {} Td {} Tj ET Q\n",
        FONT_RESOURCE_NAME,
        style.font_size,
        style.color.r,
        style.color.g,
        style.color.b,
        point.x,
        point.y,
        hex
    )
    .into_bytes()
}

fn to_unicode_cmap(glyph_map: &BTreeMap<u16, String>) -> String {
    let entries: Vec<(u16, &String)> = glyph_map.iter().map(|(g, s)| (*g, s)).collect();

    let mut out = String::new();
    out.push_str("/CIDInit /ProcSet findresource begin\n");
    out.push_str("12 dict begin\n");
    out.push_str("begincmap\n");
    out.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> def\n");
    out.push_str("/CMapName /Adobe-Identity-UCS def\n");
    out.push_str("/CMapType 2 def\n");
    out.push_str("1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

    let mut idx = 0usize;
    while idx < entries.len() {
        let end = (idx + 100).min(entries.len());
        out.push_str(&format!("{} beginbfchar\n", end - idx));
        for (gid, s) in &entries[idx..end] {
            let mut uni = String::new();
            for ch in s.chars() {
                let code = ch as u32;
                if code <= 0xFFFF {
                    uni.push_str(&format!("{:04X}", code));
                } else {
                    let code = code - 0x1_0000;
                    let high = 0xD800 | (code >> 10);
                    let low = 0xDC00 | (code & 0x3FF);
                    uni.push_str(&format!("{:04X}{:04X}", high, low));
                }
            }
            out.push_str(&format!("<{:04X}> <{}>\n", gid, uni));
        }
        out.push_str("endbfchar\n");
        idx = end;
    }

    out.push_str("endcmap\n");
    out.push_str("CMapName currentdict /CMap defineresource pop\n");
    out.push_str("end\nend\n");
    out
}

fn sanitize_font_name(name: &str) -> String {
    let mut out = String::new();
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' {
            out.push(ch);
        } else if ch == ' ' {
            out.push('-');
        }
    }
    if out.is_empty() {
        "StampFont".to_string()
    } else {
        out
    }
}
