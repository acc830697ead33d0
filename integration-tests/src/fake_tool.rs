fn main() {
    integration_tests::fake_tool_main();
}
