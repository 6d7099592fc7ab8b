use dtokit::prelude::*;

#[derive(Record)]
#[record(
    setter(field = "full_name", with = "Person::set_full_name", getter = "Person::full_name"),
    setter(field = "nickname", with = "Person::set_nickname")
)]
struct Person {
    first: String,
    last: String,
    presence: Presence,
}

impl Person {
    fn set_full_name(&mut self, full: String) {
        let (first, last) = full.split_once(' ').unwrap_or((full.as_str(), ""));
        self.first = first.to_string();
        self.last = last.to_string();
    }

    fn full_name(&self) -> String {
        format!("{} {}", self.first, self.last)
    }

    fn set_nickname(&mut self, _: String) {}
}

fn main() {
    let mapping = FieldMapping::new()
        .path("full_name", "name")
        .path("nickname", "nick");
    let person: Person = Hydrator::new(mapping)
        .hydrate(&json!({ "name": "Ada Lovelace", "nick": "ada" }))
        .unwrap();

    assert_eq!(person.first, "Ada");
    assert_eq!(person.to_map().get("full_name"), Some(&json!("Ada Lovelace")));
    assert!(person.is_populated("nickname"));
    assert!(person.to_map().get("nickname").is_none());
}
