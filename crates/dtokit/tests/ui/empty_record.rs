use dtokit::prelude::*;

#[derive(Record)]
struct Marker {
    presence: Presence,
}

fn main() {
    let marker = Marker::hydrate(&json!({ "anything": 1 })).unwrap();
    assert!(Marker::FIELDS.is_empty());
    assert!(marker.to_map().is_empty());
}
