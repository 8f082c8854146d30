pub const IS_LOADING: &str = "isLoading";
pub const GENERATION_CONFIG: &str = "generationConfig";
pub const PAGE_CONTENT: &str = "pageContent";
pub const ATTEMPTS_MADE: &str = "attemptsMade";
pub const TEST_DATA: &str = "testData";
pub const ERROR: &str = "error";
pub const SAVED_TESTS: &str = "savedTests";

/// Progress markers of an in-flight or finished generation.
pub const GENERATION_KEYS: [&str; 6] = [
    IS_LOADING,
    GENERATION_CONFIG,
    PAGE_CONTENT,
    ATTEMPTS_MADE,
    TEST_DATA,
    ERROR,
];
