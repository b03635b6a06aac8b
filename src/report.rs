//! PPT Report Generator Module
//! Writes the dashboard charts into a PowerPoint presentation, one chart per slide.
//!
//! Uses direct ZIP/XML generation (OOXML) so no Office tooling is needed.

use crate::charts::{ChartKind, RenderError, StaticChartRenderer};
use crate::pipeline::{FilterSpec, Views};
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;
use thiserror::Error;
use tracing::info;
use zip::write::FileOptions;
use zip::ZipWriter;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to render charts: {0}")]
    Render(#[from] RenderError),
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to package report: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// EMU (English Metric Units) conversion: 914400 EMU = 1 inch
const EMU_PER_INCH: i64 = 914400;
/// 16:9 slide, 13.333 x 7.5 inches
const SLIDE_WIDTH: i64 = 12192000;
const SLIDE_HEIGHT: i64 = 6858000;

/// Rendered chart size in pixels, 16:9 like the slides
pub const CHART_WIDTH: u32 = 1280;
pub const CHART_HEIGHT: u32 = 720;

/// One slide: a title bar above a PNG image.
pub struct ReportSlide {
    pub title: String,
    pub png: Vec<u8>,
}

/// Counts reported back to the caller after an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub slides: usize,
}

/// PPT generator for dashboard reports
pub struct PptGenerator;

impl PptGenerator {
    /// Render every dashboard chart for `views` and write them to `output_path`.
    pub fn export_views(
        views: &Views,
        spec: &FilterSpec,
        revenue_target: f64,
        output_path: &Path,
    ) -> Result<ExportSummary, ReportError> {
        let images =
            StaticChartRenderer::render_all(views, revenue_target, CHART_WIDTH, CHART_HEIGHT)?;

        let slides: Vec<ReportSlide> = ChartKind::ALL
            .iter()
            .zip(images)
            .map(|(kind, png)| ReportSlide {
                title: kind.title().to_string(),
                png,
            })
            .collect();

        let file = File::create(output_path)?;
        Self::write_presentation(file, &slides, "E-commerce Analytics Report", &spec.to_string())?;

        info!(
            path = %output_path.display(),
            slides = slides.len(),
            rows = views.filtered.height(),
            "exported report"
        );
        Ok(ExportSummary {
            slides: slides.len(),
        })
    }

    /// Write a presentation with one slide per entry of `slides`.
    ///
    /// `subtitle` is printed in small type at the bottom of every slide.
    pub fn write_presentation<W: Write + Seek>(
        writer: W,
        slides: &[ReportSlide],
        title: &str,
        subtitle: &str,
    ) -> Result<(), ReportError> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default();
        let count = slides.len();

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(Self::content_types_xml(count).as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(ROOT_RELS.as_bytes())?;

        zip.start_file("docProps/core.xml", options)?;
        zip.write_all(Self::core_props_xml(title).as_bytes())?;
        zip.start_file("docProps/app.xml", options)?;
        zip.write_all(Self::app_props_xml(count).as_bytes())?;

        zip.start_file("ppt/presentation.xml", options)?;
        zip.write_all(Self::presentation_xml(count).as_bytes())?;
        zip.start_file("ppt/_rels/presentation.xml.rels", options)?;
        zip.write_all(Self::presentation_rels_xml(count).as_bytes())?;

        zip.start_file("ppt/slideMasters/slideMaster1.xml", options)?;
        zip.write_all(SLIDE_MASTER.as_bytes())?;
        zip.start_file("ppt/slideMasters/_rels/slideMaster1.xml.rels", options)?;
        zip.write_all(SLIDE_MASTER_RELS.as_bytes())?;
        zip.start_file("ppt/slideLayouts/slideLayout1.xml", options)?;
        zip.write_all(SLIDE_LAYOUT.as_bytes())?;
        zip.start_file("ppt/slideLayouts/_rels/slideLayout1.xml.rels", options)?;
        zip.write_all(SLIDE_LAYOUT_RELS.as_bytes())?;
        zip.start_file("ppt/theme/theme1.xml", options)?;
        zip.write_all(THEME.as_bytes())?;

        for (idx, slide) in slides.iter().enumerate() {
            let n = idx + 1;
            zip.start_file(format!("ppt/slides/slide{}.xml", n), options)?;
            zip.write_all(Self::slide_xml(&slide.title, subtitle).as_bytes())?;
            zip.start_file(format!("ppt/slides/_rels/slide{}.xml.rels", n), options)?;
            zip.write_all(Self::slide_rels_xml(n).as_bytes())?;
            zip.start_file(format!("ppt/media/image{}.png", n), options)?;
            zip.write_all(&slide.png)?;
        }

        zip.finish()?;
        Ok(())
    }

    fn content_types_xml(slide_count: usize) -> String {
        let slides: String = (1..=slide_count)
            .map(|i| {
                format!(
                    r#"<Override PartName="/ppt/slides/slide{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Default Extension="png" ContentType="image/png"/>
<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>
<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>
<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
{slides}
</Types>"#
        )
    }

    fn presentation_xml(slide_count: usize) -> String {
        // Slide ids start at 256; rId1 is the master
        let ids: String = (1..=slide_count)
            .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + i, i + 1))
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {NS}>
<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>
<p:sldIdLst>{ids}</p:sldIdLst>
<p:sldSz cx="{SLIDE_WIDTH}" cy="{SLIDE_HEIGHT}"/>
<p:notesSz cx="{SLIDE_HEIGHT}" cy="{SLIDE_WIDTH}"/>
</p:presentation>"#
        )
    }

    fn presentation_rels_xml(slide_count: usize) -> String {
        let mut rels = vec![format!(
            r#"<Relationship Id="rId1" Type="{REL}/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#
        )];
        for i in 1..=slide_count {
            rels.push(format!(
                r#"<Relationship Id="rId{}" Type="{REL}/slide" Target="slides/slide{}.xml"/>"#,
                i + 1,
                i
            ));
        }
        rels.push(format!(
            r#"<Relationship Id="rId{}" Type="{REL}/theme" Target="theme/theme1.xml"/>"#,
            slide_count + 2
        ));
        Self::relationships(&rels)
    }

    fn slide_rels_xml(image_id: usize) -> String {
        Self::relationships(&[
            format!(
                r#"<Relationship Id="rId1" Type="{REL}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#
            ),
            format!(
                r#"<Relationship Id="rId2" Type="{REL}/image" Target="../media/image{image_id}.png"/>"#
            ),
        ])
    }

    fn relationships(entries: &[String]) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
{}
</Relationships>"#,
            entries.join("\n")
        )
    }

    /// Title on top, picture filling the middle, filter description at the bottom.
    fn slide_xml(title: &str, subtitle: &str) -> String {
        let margin = EMU_PER_INCH / 2;
        let title_h = EMU_PER_INCH * 3 / 4;
        let footer_h = EMU_PER_INCH / 2;
        let content_w = SLIDE_WIDTH - 2 * margin;

        let pic_y = margin + title_h;
        let pic_h = SLIDE_HEIGHT - pic_y - footer_h - margin / 2;
        // Keep the chart's 16:9 aspect inside the available box
        let pic_w = (pic_h * CHART_WIDTH as i64 / CHART_HEIGHT as i64).min(content_w);
        let pic_x = (SLIDE_WIDTH - pic_w) / 2;
        let footer_y = SLIDE_HEIGHT - footer_h - margin / 4;

        let title_shape = Self::text_shape(2, "Title", margin, margin / 2, content_w, title_h, 2800, true, title);
        let footer_shape = Self::text_shape(4, "Filters", margin, footer_y, content_w, footer_h, 1200, false, subtitle);

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {NS}>
<p:cSld>
<p:spTree>
<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>
<p:grpSpPr/>
{title_shape}
<p:pic>
<p:nvPicPr><p:cNvPr id="3" name="Chart"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>
<p:blipFill><a:blip r:embed="rId2"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>
<p:spPr><a:xfrm><a:off x="{pic_x}" y="{pic_y}"/><a:ext cx="{pic_w}" cy="{pic_h}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>
</p:pic>
{footer_shape}
</p:spTree>
</p:cSld>
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sld>"#
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn text_shape(
        id: usize,
        name: &str,
        x: i64,
        y: i64,
        w: i64,
        h: i64,
        size: u32,
        bold: bool,
        text: &str,
    ) -> String {
        let b = if bold { "1" } else { "0" };
        let text = xml_escape(text);
        format!(
            r#"<p:sp>
<p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>
<p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{w}" cy="{h}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>
<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" sz="{size}" b="{b}"/><a:t>{text}</a:t></a:r></a:p></p:txBody>
</p:sp>"#
        )
    }

    fn core_props_xml(title: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/">
<dc:title>{}</dc:title>
<dc:creator>E-commerce Analytics Dashboard</dc:creator>
<cp:revision>1</cp:revision>
</cp:coreProperties>"#,
            xml_escape(title)
        )
    }

    fn app_props_xml(slide_count: usize) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
<Application>E-commerce Analytics Dashboard</Application>
<PresentationFormat>Widescreen</PresentationFormat>
<Slides>{slide_count}</Slides>
</Properties>"#
        )
    }
}

/// Escape text for XML element content and attributes.
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;

const SLIDE_MASTER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
<p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld>
<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>
<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>
</p:sldMaster>"#;

const SLIDE_MASTER_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/>
</Relationships>"#;

const SLIDE_LAYOUT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="blank" preserve="1">
<p:cSld name="Blank"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld>
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sldLayout>"#;

const SLIDE_LAYOUT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="../slideMasters/slideMaster1.xml"/>
</Relationships>"#;

const THEME: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Dashboard">
<a:themeElements>
<a:clrScheme name="Dashboard"><a:dk1><a:srgbClr val="000000"/></a:dk1><a:lt1><a:srgbClr val="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="1F3B57"/></a:dk2><a:lt2><a:srgbClr val="F0F2F6"/></a:lt2><a:accent1><a:srgbClr val="1F77B4"/></a:accent1><a:accent2><a:srgbClr val="E74C3C"/></a:accent2><a:accent3><a:srgbClr val="2ECC71"/></a:accent3><a:accent4><a:srgbClr val="9B59B6"/></a:accent4><a:accent5><a:srgbClr val="F39C12"/></a:accent5><a:accent6><a:srgbClr val="1ABC9C"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme>
<a:fontScheme name="Dashboard"><a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme>
<a:fmtScheme name="Dashboard"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme>
</a:themeElements>
</a:theme>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    fn slide(title: &str) -> ReportSlide {
        ReportSlide {
            title: title.to_string(),
            png: vec![0x89, b'P', b'N', b'G'],
        }
    }

    #[test]
    fn presentation_has_one_slide_and_image_per_chart() {
        let mut buffer = Cursor::new(Vec::new());
        PptGenerator::write_presentation(
            &mut buffer,
            &[slide("Monthly Revenue"), slide("Top Products")],
            "Report",
            "Country: All",
        )
        .unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(buffer.into_inner())).unwrap();
        for name in [
            "[Content_Types].xml",
            "ppt/presentation.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/slide2.xml",
            "ppt/media/image2.png",
            "ppt/theme/theme1.xml",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing {name}");
        }
        assert!(archive.by_name("ppt/slides/slide3.xml").is_err());

        let mut presentation = String::new();
        archive
            .by_name("ppt/presentation.xml")
            .unwrap()
            .read_to_string(&mut presentation)
            .unwrap();
        assert_eq!(presentation.matches("<p:sldId ").count(), 2);

        let mut rels = String::new();
        archive
            .by_name("ppt/_rels/presentation.xml.rels")
            .unwrap()
            .read_to_string(&mut rels)
            .unwrap();
        assert!(rels.contains(r#"Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide""#));
        assert!(rels.contains(r#"Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme""#));
    }

    #[test]
    fn slide_text_is_escaped() {
        let xml = PptGenerator::slide_xml("Tools & <Parts>", "Country: \"FR\"");
        assert!(xml.contains("Tools &amp; &lt;Parts&gt;"));
        assert!(xml.contains("Country: &quot;FR&quot;"));
    }
}
