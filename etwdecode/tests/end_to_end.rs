use etwdecode::testing_common::run_end_to_end_parse_test;

#[test]
fn test_parse_records_64_bit() {
    run_end_to_end_parse_test(true);
}

#[test]
fn test_parse_records_32_bit() {
    run_end_to_end_parse_test(false);
}
