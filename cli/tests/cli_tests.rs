#[test]
fn evaluate() {
    trycmd::TestCases::new()
        .case("tests/evaluate/*.toml")
        .default_bin_name("demfit");
}

#[test]
fn models() {
    trycmd::TestCases::new()
        .case("tests/models/*.toml")
        .default_bin_name("demfit");
}

#[test]
fn run() {
    trycmd::TestCases::new()
        .case("tests/run/*.toml")
        .default_bin_name("demfit");
}
