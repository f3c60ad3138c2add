// Integration tests for auto-import

mod integration {
    mod bundler_test;
    mod cli_test;
    mod fixtures;
    mod pipeline_test;
    mod splitter_test;
}
