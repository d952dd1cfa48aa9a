//! Emits the OpenAPI document for the HTTP façade. Built only with the
//! `apidocs` feature, matching the teacher's own `gen_api` binary.

use eir_core::Colour;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "Equipment Identity Register", version = "0.1.0"),
    paths(),
    components(schemas(Colour))
)]
struct ApiDoc;

fn main() {
    let doc = ApiDoc::openapi().to_pretty_json().expect("OpenAPI document always serializes");
    println!("{doc}");
}
