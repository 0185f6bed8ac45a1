#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use ironwatch_detection::FieldMapper;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 변환 대상 쿼리
    query: String,
    /// 사용자 정의 매핑
    extra_canonical: String,
    extra_aliases: Vec<String>,
}

fuzz_target!(|input: FuzzInput| {
    let mut mapper = FieldMapper::new();

    // 임의 필드명 등록도 크래시 없이 처리되어야 함 (regex::escape 경유)
    mapper.add_mapping(&input.extra_canonical, input.extra_aliases);

    let _ = mapper.transform_direct(&input.query);
    let _ = mapper.transform_with_fallback(&input.query);
    let _ = mapper.coalesce_expression(&input.extra_canonical);
});
