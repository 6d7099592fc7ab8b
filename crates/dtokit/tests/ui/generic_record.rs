use dtokit::prelude::*;
use serde::{Serialize, de::DeserializeOwned};

#[derive(Default, Record)]
struct Envelope<T>
where
    T: Default + Serialize + DeserializeOwned + 'static,
{
    id: u64,
    payload: T,
    presence: Presence,
}

fn main() {
    let envelope: Envelope<Vec<String>> =
        Envelope::hydrate(&json!({ "id": 1, "payload": ["a"] })).unwrap();
    assert_eq!(envelope.payload, vec!["a".to_string()]);
    assert_eq!(<Envelope<u8> as Record>::FIELDS, &["id", "payload"]);
}
