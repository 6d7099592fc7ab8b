use dtokit::prelude::*;

#[derive(Record)]
#[record(name = "catalog.Brand")]
struct Brand {
    #[record(rename = "brandId")]
    id: u64,
    #[record(skip)]
    cache: Vec<u8>,
    #[record(presence)]
    seen: Presence,
}

fn main() {
    assert_eq!(Brand::NAME, "catalog.Brand");
    assert_eq!(Brand::FIELDS, &["brandId"]);

    let brand = Brand::hydrate(&json!({ "brandId": 4 })).unwrap();
    assert_eq!(brand.id, 4);
    assert!(brand.cache.is_empty());
}
