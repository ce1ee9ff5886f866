#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use linestat_core::template::{Template, parse_number};
use linestat_core::types::FieldMap;

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    template: String,
    fields: Vec<(String, String)>,
}

fuzz_target!(|input: FuzzInput| {
    let _ = parse_number(&input.template);

    let Ok(template) = Template::parse(&input.template) else {
        return;
    };
    let fields: FieldMap<'_> = input
        .fields
        .iter()
        .take(16)
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    // 모든 참조 필드가 있으면 반드시 해석되어야 함
    let complete = template.field_names().all(|name| fields.contains(name));
    let resolved = template.resolve(&fields);
    assert_eq!(resolved.is_some(), complete);
    if let Some(value) = resolved {
        let _ = parse_number(&value);
    }
});
