#[cfg(test)]
mod tests {
    use crate::logger::level_name;

    #[test]
    fn test_level_name_follows_sdk_scale() {
        assert_eq!(level_name(0), "info");
        assert_eq!(level_name(1), "error");
        assert_eq!(level_name(2), "error");
        assert_eq!(level_name(3), "warn");
        assert_eq!(level_name(4), "info");
        assert_eq!(level_name(5), "debug");
        assert_eq!(level_name(6), "trace");
        assert_eq!(level_name(-3), "info");
    }
}
