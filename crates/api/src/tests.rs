use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use extract::{ChatModel, EntityAnalyzer, EntityRecord};
use lopdf::{dictionary, Document, Object, Stream};
use store::DocumentStore;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::{router, AppState};

const BOUNDARY: &str = "----entity-test-boundary";

const ACME_REPLY: &str =
    "```json\n[{\"text\":\"Acme\",\"category\":\"Organization\",\"confidence_score\":0.9}]\n```";

/// Answers every prompt with the same canned reply, or fails.
struct CannedModel(Result<String, String>);

#[async_trait]
impl ChatModel for CannedModel {
    async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        self.0.clone().map_err(anyhow::Error::msg)
    }
}

struct TestApp {
    router: Router,
    store: DocumentStore,
    uploads: TempDir,
}

impl TestApp {
    fn with_reply(reply: Result<&str, &str>) -> Self {
        let model = CannedModel(reply.map(str::to_string).map_err(str::to_string));
        let store = DocumentStore::open_in_memory().unwrap();
        let uploads = tempfile::tempdir().unwrap();

        let state = Arc::new(AppState {
            analyzer: EntityAnalyzer::new(Arc::new(model)),
            store: store.clone(),
            upload_dir: uploads.path().to_path_buf(),
            max_upload_bytes: 1024 * 1024,
        });

        Self {
            router: router(state),
            store,
            uploads,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn upload(&self, parts: &[Part<'_>]) -> Response {
        self.send(multipart_request(parts)).await
    }

    fn count(&self) -> u64 {
        self.store.count().unwrap()
    }
}

struct Part<'a> {
    name: &'a str,
    filename: Option<&'a str>,
    data: &'a [u8],
}

fn file<'a>(filename: &'a str, data: &'a [u8]) -> Part<'a> {
    Part {
        name: "document",
        filename: Some(filename),
        data,
    }
}

fn multipart_request(parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        write!(body, "--{BOUNDARY}\r\n").unwrap();
        match part.filename {
            Some(filename) => write!(
                body,
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                part.name, filename
            )
            .unwrap(),
            None => write!(
                body,
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                part.name
            )
            .unwrap(),
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    write!(body, "--{BOUNDARY}--\r\n").unwrap();

    Request::post("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn stored_id(response: &Response) -> i64 {
    location(response)
        .strip_prefix("/result/")
        .and_then(|id| id.parse().ok())
        .expect("redirect to a result page")
}

fn build_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for line in pages {
        let content = format!("BT\n/F1 12 Tf\n72 720 Td\n({line}) Tj\nET\n");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! { "Type" => "Pages", "Kids" => kids, "Count" => count }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

#[tokio::test]
async fn test_upload_form_renders() {
    let app = TestApp::with_reply(Ok("[]"));

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains(r#"action="/upload""#));
    assert!(html.contains(r#"name="document""#));
}

#[tokio::test]
async fn test_missing_document_field() {
    let app = TestApp::with_reply(Ok(ACME_REPLY));

    let response = app
        .upload(&[Part {
            name: "attachment",
            filename: Some("report.pdf"),
            data: b"%PDF-1.4",
        }])
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "No file part");
    assert_eq!(app.count(), 0);
}

#[tokio::test]
async fn test_non_multipart_request() {
    let app = TestApp::with_reply(Ok(ACME_REPLY));

    let request = Request::post("/upload")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "No file part");
}

#[tokio::test]
async fn test_empty_filename() {
    let app = TestApp::with_reply(Ok(ACME_REPLY));

    let response = app.upload(&[file("", b"")]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "No selected file");
    assert_eq!(app.count(), 0);
}

#[tokio::test]
async fn test_unsupported_extension() {
    let app = TestApp::with_reply(Ok(ACME_REPLY));

    for name in ["notes.txt", "image.png", "noextension", "report.pdf.exe"] {
        let response = app.upload(&[file(name, b"some bytes")]).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{name}");
        assert_eq!(body_text(response).await, "Unsupported file type");
    }

    assert_eq!(app.count(), 0);
    assert_eq!(std::fs::read_dir(app.uploads.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_pdf_upload_stores_text_and_entities() {
    let app = TestApp::with_reply(Ok(ACME_REPLY));
    let pdf = build_pdf(&["Acme Corporation", "Jane Smith in Berlin"]);

    let response = app.upload(&[file("Annual Report.PDF", &pdf)]).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    let id = stored_id(&response);

    let document = app.store.get(id).unwrap().expect("document stored");
    assert_eq!(document.filename, "Annual_Report.PDF");
    let first = document.content.find("Acme Corporation").expect("page one text");
    let second = document.content.find("Jane Smith in Berlin").expect("page two text");
    assert!(first < second);

    let entities: Vec<EntityRecord> = document.entities_as().unwrap();
    assert_eq!(entities, vec![EntityRecord::new("Acme", "Organization", 0.9)]);

    let saved = app.uploads.path().join("Annual_Report.PDF");
    assert_eq!(std::fs::read(saved).unwrap(), pdf);
}

#[tokio::test]
async fn test_unparseable_pdf_still_redirects() {
    let app = TestApp::with_reply(Ok(ACME_REPLY));

    let response = app.upload(&[file("broken.pdf", b"this was never a pdf")]).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let document = app.store.get(stored_id(&response)).unwrap().unwrap();
    assert_eq!(document.content, "");
}

#[tokio::test]
async fn test_invalid_model_reply_stores_no_entities() {
    let app = TestApp::with_reply(Ok("```json\n[{\"text\": \"Acme\",, }]\n```"));

    let response = app.upload(&[file("letter.docx", &build_docx(&["Acme"]))]).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let document = app.store.get(stored_id(&response)).unwrap().unwrap();
    assert_eq!(document.entities, "[]");
}

#[tokio::test]
async fn test_model_failure_stores_no_entities() {
    let app = TestApp::with_reply(Err("connection refused"));

    let response = app.upload(&[file("letter.docx", &build_docx(&["Acme"]))]).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let document = app.store.get(stored_id(&response)).unwrap().unwrap();
    assert_eq!(document.content, "Acme");
    assert_eq!(document.entities_as::<Vec<EntityRecord>>().unwrap(), vec![]);
}

#[tokio::test]
async fn test_docx_paragraphs_joined() {
    let app = TestApp::with_reply(Ok("[]"));

    let docx = build_docx(&["Dear Jane Smith,", "Acme Corporation", "Berlin"]);
    let response = app.upload(&[file("letter.DOCX", &docx)]).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let document = app.store.get(stored_id(&response)).unwrap().unwrap();
    assert_eq!(document.content, "Dear Jane Smith,\nAcme Corporation\nBerlin");
}

#[tokio::test]
async fn test_malformed_docx_is_server_error() {
    let app = TestApp::with_reply(Ok(ACME_REPLY));

    let response = app.upload(&[file("letter.docx", b"not a zip archive")]).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "Internal Server Error");
    assert_eq!(app.count(), 0);
}

#[tokio::test]
async fn test_store_failure_is_server_error() {
    let app = TestApp::with_reply(Ok(ACME_REPLY));
    app.store
        .with_session(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER reject_all BEFORE INSERT ON documents
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )?;
            Ok(())
        })
        .unwrap();

    let response = app.upload(&[file("letter.docx", &build_docx(&["Acme"]))]).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get(header::LOCATION).is_none());
    assert_eq!(body_text(response).await, "Internal Server Error");
    assert_eq!(app.count(), 0);
}

#[tokio::test]
async fn test_filename_is_sanitized() {
    let app = TestApp::with_reply(Ok("[]"));

    let response = app
        .upload(&[file("../../secret plans.docx", &build_docx(&["x"]))])
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);

    assert!(app.uploads.path().join("secret_plans.docx").exists());
    let document = app.store.get(stored_id(&response)).unwrap().unwrap();
    assert_eq!(document.filename, "secret_plans.docx");
}

#[tokio::test]
async fn test_first_document_field_wins() {
    let app = TestApp::with_reply(Ok("[]"));
    let docx = build_docx(&["first"]);

    let response = app
        .upload(&[
            Part {
                name: "comment",
                filename: None,
                data: b"ignored",
            },
            file("first.docx", &docx),
            file("second.txt", b"ignored"),
        ])
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let document = app.store.get(stored_id(&response)).unwrap().unwrap();
    assert_eq!(document.filename, "first.docx");
}

#[tokio::test]
async fn test_result_renders_entities_in_order() {
    let app = TestApp::with_reply(Ok("[]"));
    let entities = vec![
        EntityRecord::new("Jane Smith", "Person", 0.97),
        EntityRecord::new("Acme", "Organization", 0.9),
        EntityRecord::new("<b>Berlin</b>", "Location", 0.5),
    ];
    let id = app.store.create("letter.pdf", "text", &entities).unwrap();

    let response = app.get(&format!("/result/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;

    let jane = html.find("Jane Smith").unwrap();
    let acme = html.find("Acme").unwrap();
    let berlin = html.find("&lt;b&gt;Berlin&lt;/b&gt;").expect("entity text is escaped");
    assert!(jane < acme && acme < berlin);
    assert!(html.contains("0.97"));
    assert_eq!(html.matches(r#"class="entity""#).count(), 3);
}

#[tokio::test]
async fn test_result_is_stable_across_reads() {
    let app = TestApp::with_reply(Ok(ACME_REPLY));

    let response = app.upload(&[file("letter.docx", &build_docx(&["Acme"]))]).await;
    let uri = location(&response).to_string();

    let first = body_text(app.get(&uri).await).await;
    let second = body_text(app.get(&uri).await).await;
    assert_eq!(first, second);
    assert!(first.contains("Acme"));
    assert_eq!(app.count(), 1);
}

#[tokio::test]
async fn test_result_without_entities() {
    let app = TestApp::with_reply(Ok("[]"));
    let id = app.store.create("empty.pdf", "", &Vec::<EntityRecord>::new()).unwrap();

    let html = body_text(app.get(&format!("/result/{id}")).await).await;
    assert!(html.contains("No entities were found"));
}

#[tokio::test]
async fn test_unknown_result_is_not_found() {
    let app = TestApp::with_reply(Ok("[]"));

    for uri in ["/result/999", "/result/abc"] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body_text(response).await, "Document not found");
    }
}

#[tokio::test]
async fn test_health_reports_document_count() {
    let app = TestApp::with_reply(Ok("[]"));
    app.store.create("a.pdf", "", &Vec::<EntityRecord>::new()).unwrap();

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let health: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(health["database"], "ok");
    assert_eq!(health["documents"], 1);
}
