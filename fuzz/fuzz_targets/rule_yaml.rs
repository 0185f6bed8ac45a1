#![no_main]

use std::path::Path;

use ironwatch_detection::rule::RuleLoader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // parse_yaml은 &str 입력만 받는다. UTF-8이 아닌 바이트열은 건너뜀
    if let Ok(yaml_str) = std::str::from_utf8(data) {
        if let Ok(rule) = RuleLoader::parse_yaml(yaml_str, Path::new("fuzz-input.yml")) {
            // 파싱에 성공한 규칙의 파생 필드 불변식
            assert_eq!(rule.id.len(), 12);
            assert!(rule.id.bytes().all(|b| b.is_ascii_hexdigit()));
            assert!(matches!(
                rule.category.as_str(),
                "GDPR" | "NIST" | "PCI-DSS" | "unknown"
            ));
        }
    }
});
