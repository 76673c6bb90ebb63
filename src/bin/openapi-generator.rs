//! Dump the OpenAPI document as pretty JSON for frontend codegen.

use fairway_live::services::documentation::ApiDoc;
use utoipa::OpenApi;

fn main() {
    let doc = ApiDoc::openapi();
    println!("{}", doc.to_pretty_json().unwrap());
}
