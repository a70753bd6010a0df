// src/services/pdfs.rs

//! PDF link extraction.
//!
//! Walks a parsed page in document order and turns every anchor pointing to a
//! `.pdf` into a [`PdfRecord`]. The publish date is taken from the first
//! paragraph next to the link's container:
//!
//! ```html
//! <div>
//!   <span><a href="bases.pdf">Bases (757 KB)</a></span>
//!   <p>Fecha de publicación: 14 de junio de 2023</p>
//! </div>
//! ```

use std::sync::Arc;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{AppError, Result};
use crate::models::{PdfRecord, PublishDate};
use crate::utils::SpanishDateParser;

const ANCHOR_SELECTOR: &str = "a[href]";
const PDF_SUFFIX: &str = ".pdf";
const DATE_ELEMENT: &str = "p";

/// Trailing size annotation such as `(234 KB)` or `(1,2MB)`.
const SIZE_PATTERN: &str = r"(?i)\s*\(\s*[0-9]+(?:[.,][0-9]+)?\s*[KM]B\s*\)\s*$";

/// Stateless extractor; every scan re-discovers all PDFs on the page.
#[derive(Debug, Clone)]
pub struct PdfExtractor {
    anchor_sel: Selector,
    size_annotation: Regex,
    dates: SpanishDateParser,
}

impl PdfExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            anchor_sel: Self::parse_selector(ANCHOR_SELECTOR)?,
            size_annotation: Regex::new(SIZE_PATTERN)?,
            dates: SpanishDateParser::new()?,
        })
    }

    /// Lazily yield the PDF records of `document` in document order.
    pub fn records<'a>(&'a self, document: &'a Html) -> impl Iterator<Item = PdfRecord> + 'a {
        document
            .select(&self.anchor_sel)
            .filter_map(move |anchor| self.build_record(anchor))
    }

    /// Parse `html` and collect its records.
    pub fn extract(&self, html: &str) -> Vec<PdfRecord> {
        let document = Html::parse_document(html);
        self.records(&document).collect()
    }

    /// Strip a trailing size annotation and surrounding whitespace.
    pub fn clean_name(&self, raw: &str) -> String {
        self.size_annotation
            .replace(raw.trim(), "")
            .trim()
            .to_string()
    }

    fn build_record(&self, anchor: ElementRef<'_>) -> Option<PdfRecord> {
        // html5ever keeps only the first of duplicated attributes.
        let href = anchor.value().attr("href")?;
        if !href.ends_with(PDF_SUFFIX) {
            return None;
        }

        let raw_name = anchor
            .children()
            .find_map(|node| node.value().as_text().map(|text| text.to_string()))?;
        let name = self.clean_name(&raw_name);
        if name.is_empty() {
            return None;
        }

        Some(PdfRecord {
            url: href.to_string(),
            publish_date: self.find_date(anchor, &name),
            name,
        })
    }

    /// First paragraph among the children of the anchor's grandparent.
    fn find_date(&self, anchor: ElementRef<'_>, name: &str) -> Option<PublishDate> {
        let container = anchor.parent()?.parent()?;
        let paragraph = container
            .children()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == DATE_ELEMENT)?;
        let text: String = paragraph.text().collect();

        match self.dates.parse(&text) {
            Ok(date) => Some(date),
            Err(e) => {
                log::debug!("Leaving date of '{}' blank: {}", name, e);
                None
            }
        }
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

/// Records of one page, produced on a blocking task and handed over one at
/// a time. The stream ends when the page is exhausted.
pub struct PdfStream {
    rx: mpsc::Receiver<PdfRecord>,
    producer: JoinHandle<usize>,
}

impl PdfStream {
    /// Wait for the next record; `None` once the page is exhausted.
    pub async fn next(&mut self) -> Option<PdfRecord> {
        self.rx.recv().await
    }

    /// Stop consuming and wait for the producer. Returns how many records
    /// it handed over.
    pub async fn finish(self) -> usize {
        drop(self.rx);
        match self.producer.await {
            Ok(count) => count,
            Err(e) => {
                log::error!("PDF extraction task failed: {}", e);
                0
            }
        }
    }
}

/// Parse `body` and stream its records. Parsing runs on the blocking pool
/// since the parsed document cannot cross an await point.
pub fn spawn_extraction(extractor: Arc<PdfExtractor>, body: String) -> PdfStream {
    let (tx, rx) = mpsc::channel(1);
    let producer = tokio::task::spawn_blocking(move || {
        let document = Html::parse_document(&body);
        let mut sent = 0;
        for record in extractor.records(&document) {
            if tx.blocking_send(record).is_err() {
                // Consumer went away.
                break;
            }
            sent += 1;
        }
        sent
    });

    PdfStream { rx, producer }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISCLAIMER: &str = concat!(
        "<div class=\"disclaimer\">",
        "<a href=\"some pdf url.pdf\" target=\"_blank\"> <img alt=\"pdf\" src=\"/iconos/pdf.gif\"></a>",
        "<span> <a href=\"some pdf url.pdf\" target=\"_blank\">some pdf name (757 KB)</a></span>",
        "<p>Fecha de publicación:14 de junio de 2023</p></div>"
    );

    fn extractor() -> PdfExtractor {
        PdfExtractor::new().unwrap()
    }

    #[test]
    fn test_clean_name() {
        let ex = extractor();
        let want = "my pdf name";
        assert_eq!(ex.clean_name("my pdf name"), want);
        assert_eq!(ex.clean_name("my pdf name (234KB)"), want);
        assert_eq!(ex.clean_name("my pdf name (234 KB)"), want);
        assert_eq!(ex.clean_name(" my pdf name (234 KB) "), want);
        assert_eq!(ex.clean_name("my pdf name (1,5 MB)"), want);
        assert_eq!(ex.clean_name("Anexo (I) del temario"), "Anexo (I) del temario");
    }

    #[test]
    fn test_size_annotation_and_date() {
        let html = "<div><span><a href=\"doc.pdf\">Report (100 KB)</a></span>\
                    <p>Fecha de publicación: 5 de mayo de 2024</p></div>";
        let records = extractor().extract(html);
        assert_eq!(
            records,
            vec![PdfRecord {
                url: "doc.pdf".into(),
                name: "Report".into(),
                publish_date: PublishDate::from_ymd(2024, 5, 5),
            }]
        );
        assert_eq!(records[0].date_text(), "05/05/2024");
    }

    #[test]
    fn test_icon_anchor_is_skipped() {
        let records = extractor().extract(DISCLAIMER);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "some pdf name");
        assert_eq!(records[0].url, "some pdf url.pdf");
        assert_eq!(records[0].date_text(), "14/06/2023");
    }

    #[test]
    fn test_no_date_paragraph() {
        let html = concat!(
            "<div class=\"disclaimer\">",
            "<span> <a href=\"some pdf url.pdf\">some pdf name (757 KB)</a></span>",
            "</div>"
        );
        let records = extractor().extract(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "some pdf name");
        assert!(records[0].publish_date.is_none());
    }

    #[test]
    fn test_unparsable_date_is_blank() {
        let html = "<div><span><a href=\"a.pdf\">Acta</a></span><p>Fecha: pendiente</p></div>";
        let records = extractor().extract(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date_text(), "");
    }

    #[test]
    fn test_only_pdf_links() {
        let html = r#"
            <ul>
              <li><a href="/inicio.html">Inicio</a></li>
              <li><a href="/bases.PDF">Mayúsculas</a></li>
              <li><a href="/listado.pdf?v=2">Con query</a></li>
              <li><a name="ancla">Sin href</a></li>
              <li><a href="/temario.pdf">Temario (12 KB)</a></li>
            </ul>"#;
        let records = extractor().extract(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, "/temario.pdf");
    }

    #[test]
    fn test_document_order() {
        let html = r#"
            <div><div><a href="1.pdf">Primero</a></div><p>1 de enero de 2024</p></div>
            <section>
              <div><div><a href="2.pdf">Segundo</a></div><p>2 de enero de 2024</p></div>
            </section>
            <div><div><a href="3.pdf">Tercero</a></div></div>"#;
        let names: Vec<_> = extractor()
            .extract(html)
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Primero", "Segundo", "Tercero"]);
    }

    #[test]
    fn test_first_paragraph_only() {
        let html = "<div><span><a href=\"a.pdf\">Acta</a></span>\
                    <p>Sin fecha</p><p>3 de marzo de 2024</p></div>";
        let records = extractor().extract(html);
        assert!(records[0].publish_date.is_none());
    }

    #[tokio::test]
    async fn test_stream_yields_all_then_ends() {
        let html = r#"
            <div><span><a href="a.pdf">A (1 KB)</a></span><p>1 de abril de 2024</p></div>
            <div><span><a href="b.pdf">B</a></span></div>"#;
        let mut stream = spawn_extraction(Arc::new(extractor()), html.to_string());

        let first = stream.next().await.unwrap();
        assert_eq!(first.name, "A");
        assert_eq!(first.date_text(), "01/04/2024");
        let second = stream.next().await.unwrap();
        assert_eq!(second.name, "B");
        assert!(stream.next().await.is_none());
        assert_eq!(stream.finish().await, 2);
    }

    #[tokio::test]
    async fn test_stream_of_page_without_pdfs() {
        let mut stream =
            spawn_extraction(Arc::new(extractor()), "<html><body>nada</body></html>".into());
        assert!(stream.next().await.is_none());
        assert_eq!(stream.finish().await, 0);
    }
}
