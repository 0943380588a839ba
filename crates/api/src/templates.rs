//! Askama page templates; files live in `templates/`.

use askama::Template;
use extract::EntityRecord;

#[derive(Template)]
#[template(path = "upload.html")]
pub struct UploadPage;

#[derive(Template)]
#[template(path = "result.html")]
pub struct ResultPage<'a> {
    pub filename: &'a str,
    pub entities: &'a [EntityRecord],
}
