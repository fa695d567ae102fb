fn main() {
    wrencc_test::cli::run();
}
