//! Test fixtures: a synthesized multi-page template PDF and a minimal but
//! valid TrueType font, so tests need no binary assets on disk.

use lopdf::{Document as LoDocument, Object as LoObject, Stream as LoStream, dictionary};

/// Build an n-page template PDF in memory. Each page carries one line of
/// Helvetica text so content streams are non-empty and distinguishable.
pub(crate) fn template_pdf(pages: usize) -> Vec<u8> {
    let mut doc = LoDocument::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<LoObject> = Vec::with_capacity(pages);
    for i in 0..pages {
        let content = format!("BT /F1 18 Tf 72 720 Td (Template page {}) Tj ET", i + 1)
            .into_bytes();
        let content_id = doc.add_object(LoStream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        LoObject::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut std::io::Cursor::new(&mut out)).expect("save fixture pdf");
    out
}

/// Hand-assembled TrueType font: 1000 units/em, two glyphs, cmap mapping
/// 'A' (U+0041) and U+0A86 to glyph 1. Enough for ttf-parser metrics and
/// rustybuzz shaping; no outlines, which neither needs.
pub(crate) fn minimal_test_font() -> Vec<u8> {
    let cmap = build_cmap();
    let head = build_head();
    let hhea = build_hhea();
    let hmtx = build_hmtx();
    let maxp = build_maxp();

    // Directory entries must stay sorted by tag.
    let tables: [(&[u8; 4], &[u8]); 5] = [
        (b"cmap", &cmap),
        (b"head", &head),
        (b"hhea", &hhea),
        (b"hmtx", &hmtx),
        (b"maxp", &maxp),
    ];

    let mut out = Vec::new();
    push_u32(&mut out, 0x0001_0000); // sfnt version
    push_u16(&mut out, tables.len() as u16);
    push_u16(&mut out, 64); // searchRange: 16 * 4
    push_u16(&mut out, 2); // entrySelector
    push_u16(&mut out, 16); // rangeShift

    let mut offset = 12 + 16 * tables.len();
    for (tag, data) in &tables {
        out.extend_from_slice(*tag);
        push_u32(&mut out, 0); // checksum, not validated by parsers
        push_u32(&mut out, offset as u32);
        push_u32(&mut out, data.len() as u32);
        offset += padded_len(data.len());
    }
    for (_, data) in &tables {
        out.extend_from_slice(data);
        for _ in data.len()..padded_len(data.len()) {
            out.push(0);
        }
    }
    out
}

fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn push_i16(out: &mut Vec<u8>, value: i16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn build_head() -> Vec<u8> {
    let mut t = Vec::new();
    push_u32(&mut t, 0x0001_0000); // version
    push_u32(&mut t, 0x0001_0000); // fontRevision
    push_u32(&mut t, 0); // checkSumAdjustment
    push_u32(&mut t, 0x5F0F_3CF5); // magicNumber
    push_u16(&mut t, 0x0003); // flags
    push_u16(&mut t, 1000); // unitsPerEm
    t.extend_from_slice(&[0u8; 8]); // created
    t.extend_from_slice(&[0u8; 8]); // modified
    push_i16(&mut t, 0); // xMin
    push_i16(&mut t, -200); // yMin
    push_i16(&mut t, 800); // xMax
    push_i16(&mut t, 800); // yMax
    push_u16(&mut t, 0); // macStyle
    push_u16(&mut t, 8); // lowestRecPPEM
    push_i16(&mut t, 2); // fontDirectionHint
    push_i16(&mut t, 0); // indexToLocFormat
    push_i16(&mut t, 0); // glyphDataFormat
    t
}

fn build_hhea() -> Vec<u8> {
    let mut t = Vec::new();
    push_u32(&mut t, 0x0001_0000); // version
    push_i16(&mut t, 800); // ascender
    push_i16(&mut t, -200); // descender
    push_i16(&mut t, 0); // lineGap
    push_u16(&mut t, 600); // advanceWidthMax
    push_i16(&mut t, 0); // minLeftSideBearing
    push_i16(&mut t, 0); // minRightSideBearing
    push_i16(&mut t, 600); // xMaxExtent
    push_i16(&mut t, 1); // caretSlopeRise
    push_i16(&mut t, 0); // caretSlopeRun
    push_i16(&mut t, 0); // caretOffset
    for _ in 0..4 {
        push_i16(&mut t, 0); // reserved
    }
    push_i16(&mut t, 0); // metricDataFormat
    push_u16(&mut t, 2); // numberOfHMetrics
    t
}

fn build_maxp() -> Vec<u8> {
    let mut t = Vec::new();
    push_u32(&mut t, 0x0000_5000); // version 0.5, no glyf required
    push_u16(&mut t, 2); // numGlyphs
    t
}

fn build_hmtx() -> Vec<u8> {
    let mut t = Vec::new();
    push_u16(&mut t, 500); // gid 0 advance
    push_i16(&mut t, 0);
    push_u16(&mut t, 600); // gid 1 advance
    push_i16(&mut t, 0);
    t
}

fn build_cmap() -> Vec<u8> {
    // Segments sorted by end code: [0x0041], [0x0A86], [0xFFFF].
    let ends: [u16; 3] = [0x0041, 0x0A86, 0xFFFF];
    let starts: [u16; 3] = [0x0041, 0x0A86, 0xFFFF];
    // idDelta maps each single-char segment to glyph 1.
    let deltas: [u16; 3] = [0xFFC0, 0xF57B, 0x0001];

    let mut sub = Vec::new();
    push_u16(&mut sub, 4); // format
    push_u16(&mut sub, 40); // length
    push_u16(&mut sub, 0); // language
    push_u16(&mut sub, 6); // segCountX2
    push_u16(&mut sub, 4); // searchRange
    push_u16(&mut sub, 1); // entrySelector
    push_u16(&mut sub, 2); // rangeShift
    for end in ends {
        push_u16(&mut sub, end);
    }
    push_u16(&mut sub, 0); // reservedPad
    for start in starts {
        push_u16(&mut sub, start);
    }
    for delta in deltas {
        push_u16(&mut sub, delta);
    }
    for _ in 0..3 {
        push_u16(&mut sub, 0); // idRangeOffset
    }
    debug_assert_eq!(sub.len(), 40);

    let mut t = Vec::new();
    push_u16(&mut t, 0); // version
    push_u16(&mut t, 1); // numTables
    push_u16(&mut t, 3); // platformID: Windows
    push_u16(&mut t, 1); // encodingID: Unicode BMP
    push_u32(&mut t, 12); // subtable offset
    t.extend_from_slice(&sub);
    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_pdf_fixture_has_requested_page_count() {
        let bytes = template_pdf(5);
        let doc = LoDocument::load_mem(&bytes).expect("load fixture");
        assert_eq!(doc.get_pages().len(), 5);
    }

    #[test]
    fn minimal_font_parses_with_expected_glyph_mapping() {
        let data = minimal_test_font();
        let face = ttf_parser::Face::parse(&data, 0).expect("parse fixture font");
        assert_eq!(face.units_per_em(), 1000);
        assert_eq!(face.number_of_glyphs(), 2);
        assert_eq!(face.glyph_index('A').map(|g| g.0), Some(1));
        assert_eq!(face.glyph_index('\u{0A86}').map(|g| g.0), Some(1));
        assert_eq!(face.glyph_index('B'), None);
    }
}
