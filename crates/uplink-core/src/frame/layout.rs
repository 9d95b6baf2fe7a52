/// Bytes occupied by a (channel, type) tag.
pub const TAG_LEN: usize = 2;
pub const CHANNEL_OFFSET: usize = 0;
pub const TYPE_OFFSET: usize = 1;

/// Bytes stepped over after an unrecognised tag under the lenient policy.
pub const UNKNOWN_TAG_SKIP_LEN: usize = 1;
