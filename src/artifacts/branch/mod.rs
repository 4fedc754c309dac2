pub mod branch_name;
pub mod ref_update;

pub const INVALID_BRANCH_NAME_REGEX: &str =
    r"^\.|\/\.|\.\.|^\/|\/$|\.lock$|@\{|^@$|[\x00-\x20\*:\?\[\\~\^\x7f]";
