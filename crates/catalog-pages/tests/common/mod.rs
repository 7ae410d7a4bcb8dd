#![allow(dead_code)]

use catalog_pages::*;
use lopdf::{Dictionary, Document, Object, Stream};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Workbook with the default sheet layout: two front-matter pages, a
/// schedule, a hidden English template and an unrelated notes page.
pub fn catalog_book(ids: &[&str]) -> MemoryWorkbook {
    let mut book = MemoryWorkbook::new();
    book.add_sheet("Cover").set("A1", "Product Catalog").unwrap();
    book.add_sheet("GenInfo+Contacts")
        .set("A1", "General information")
        .unwrap();

    let schedule = book.add_sheet("Schedule");
    schedule.set("A1", "Lighting schedule").unwrap();
    schedule.set("A9", "ID").unwrap();
    schedule.set("B9", "Description").unwrap();
    schedule.set("C9", "Qty").unwrap();
    for (i, id) in ids.iter().enumerate() {
        let row = 11 + i;
        schedule.set(&format!("A{}", row), *id).unwrap();
        schedule
            .set(&format!("B{}", row), format!("Fixture {}", i + 1))
            .unwrap();
        schedule.set(&format!("C{}", row), "4").unwrap();
    }

    let template = book.add_sheet("Template_EN");
    template.set("A1", "Fixture sheet").unwrap();
    template.set("B3", "Type: LC-XX").unwrap();
    template.set("F40", "See LW-YY").unwrap();
    template.visible = false;

    book.add_sheet("Notes").set("A1", "internal").unwrap();
    book
}

/// The `catalog_book` layout as a real `catalog.xlsx` inside `dir`, with
/// `list_ids` naming the identifier column
pub fn catalog_xlsx(dir: &Path, ids: &[&str]) -> PathBuf {
    let mut book = umya_spreadsheet::new_file();
    book.get_sheet_by_name_mut("Sheet1").unwrap().set_name("Cover");
    book.get_sheet_by_name_mut("Cover")
        .unwrap()
        .get_cell_mut("A1")
        .set_value("Product Catalog");
    book.new_sheet("GenInfo+Contacts")
        .unwrap()
        .get_cell_mut("A1")
        .set_value("General information");

    let schedule = book.new_sheet("Schedule").unwrap();
    schedule.get_cell_mut("A1").set_value("Lighting schedule");
    schedule.get_cell_mut("A9").set_value("ID");
    schedule.get_cell_mut("B9").set_value("Description");
    schedule.get_cell_mut("C9").set_value("Qty");
    for (i, id) in ids.iter().enumerate() {
        let row = 11 + i;
        schedule.get_cell_mut(format!("A{}", row).as_str()).set_value(*id);
        schedule
            .get_cell_mut(format!("B{}", row).as_str())
            .set_value(format!("Fixture {}", i + 1));
        schedule.get_cell_mut(format!("C{}", row).as_str()).set_value("4");
    }
    schedule
        .add_defined_name("list_ids", "Schedule!$A$11:$A$20")
        .unwrap();

    let template = book.new_sheet("Template_EN").unwrap();
    template.get_cell_mut("A1").set_value("Fixture sheet");
    template.get_cell_mut("B3").set_value("Type: LC-XX");
    template.get_cell_mut("F40").set_value("See LW-YY");
    template.set_sheet_state("hidden".to_string());

    book.new_sheet("Notes")
        .unwrap()
        .get_cell_mut("A1")
        .set_value("internal");

    let path = dir.join("catalog.xlsx");
    umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();
    path
}

/// Save `book` as `catalog.json` inside `dir`
pub fn save_book(book: &MemoryWorkbook, dir: &Path) -> PathBuf {
    let path = dir.join("catalog.json");
    book.save(&path).unwrap();
    path
}

pub fn write_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    image::RgbImage::from_pixel(width, height, image::Rgb([200, 120, 40]))
        .save(&path)
        .unwrap();
    path
}

pub fn create_test_pdf(num_pages: usize) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for _ in 0..num_pages {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(595),
                    Object::Integer(842),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(num_pages as i64)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);
    doc
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open(PathBuf),
    SetVisibility(String, bool),
    Export(PathBuf),
    Close,
}

/// Renderer that works on a JSON or `.xlsx` workbook and writes one PDF page per visible sheet
#[derive(Default)]
pub struct FakeRenderer {
    pub fail_open: bool,
    pub fail_export: bool,
    pub calls: Mutex<Vec<Call>>,
    /// Sheets visible at export time, in document order
    pub exported: Mutex<Vec<String>>,
    /// Visibility of every sheet when the session was closed
    pub closed_state: Mutex<Option<Vec<(String, bool)>>>,
}

impl FakeRenderer {
    pub fn failing_export() -> Self {
        Self {
            fail_export: true,
            ..Self::default()
        }
    }

    pub fn failing_open() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

pub struct FakeSession {
    book: Box<dyn Workbook>,
}

fn open_any(document: &Path) -> Result<Box<dyn Workbook>> {
    let is_xlsx = document
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
    if is_xlsx {
        Ok(Box::new(XlsxWorkbook::open(document)?))
    } else {
        Ok(Box::new(MemoryWorkbook::open(document)?))
    }
}

impl Renderer for FakeRenderer {
    type Session = FakeSession;

    fn open(&self, document: &Path) -> Result<FakeSession> {
        self.record(Call::Open(document.to_path_buf()));
        if self.fail_open {
            return Err(CatalogError::Render("renderer unavailable".to_string()));
        }
        Ok(FakeSession {
            book: open_any(document)?,
        })
    }

    fn set_visibility(&self, session: &mut FakeSession, page: &str, visible: bool) -> Result<()> {
        self.record(Call::SetVisibility(page.to_string(), visible));
        session.book.set_visible(page, visible)
    }

    fn export(&self, session: &mut FakeSession, output: &Path, _format: PageFormat) -> Result<()> {
        self.record(Call::Export(output.to_path_buf()));
        if self.fail_export {
            return Err(CatalogError::Render("export crashed".to_string()));
        }
        let visible: Vec<String> = session
            .book
            .sheet_names()
            .into_iter()
            .filter(|name| session.book.is_visible(name) == Some(true))
            .collect();
        create_test_pdf(visible.len()).save(output)?;
        *self.exported.lock().unwrap() = visible;
        Ok(())
    }

    fn close(&self, session: FakeSession) -> Result<()> {
        self.record(Call::Close);
        let state = visibility_of(session.book.as_ref());
        *self.closed_state.lock().unwrap() = Some(state);
        Ok(())
    }
}

pub fn visibility_of(book: &dyn Workbook) -> Vec<(String, bool)> {
    book.sheet_names()
        .into_iter()
        .map(|name| {
            let visible = book.is_visible(&name).unwrap_or(true);
            (name, visible)
        })
        .collect()
}

pub fn ids(values: &[&str]) -> Vec<Identifier> {
    values.iter().map(|v| Identifier::clean(v).unwrap()).collect()
}
