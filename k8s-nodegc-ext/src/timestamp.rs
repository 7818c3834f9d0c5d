use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub trait TimeExt {
    fn rfc3339(&self) -> String;
}

impl TimeExt for OffsetDateTime {
    /// Format as RFC 3339, the way the API server renders timestamps.
    ///
    /// # Examples
    ///
    /// ```
    /// use k8s_nodegc_ext::TimeExt as _;
    ///
    /// let epoch = time::OffsetDateTime::UNIX_EPOCH;
    /// assert_eq!(epoch.rfc3339(), "1970-01-01T00:00:00Z");
    /// ```
    fn rfc3339(&self) -> String {
        self.format(&Rfc3339).unwrap_or_default()
    }
}
