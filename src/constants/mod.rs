pub mod quiz_prompt;
pub mod storage_keys;
