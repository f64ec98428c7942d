#[path = "../../tests/fixtures/builder.rs"]
pub(crate) mod builder;
