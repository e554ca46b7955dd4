/// Validate the S3 storage configuration as a group.
///
/// Either no S3 variable is set (the server falls back to an in-memory
/// store) or bucket, region, both keys and the public media URL are all
/// present. The endpoint stays optional for AWS-hosted buckets.
pub fn validate_storage(
    bucket: &Option<String>,
    region: &Option<String>,
    access_key: &Option<String>,
    secret_key: &Option<String>,
    public_media_url: &Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let any_set = bucket.is_some() || region.is_some() || access_key.is_some() || secret_key.is_some();
    if !any_set {
        return Ok(());
    }

    let mut missing = Vec::new();
    if bucket.is_none() {
        missing.push("STORAGE_S3_BUCKET");
    }
    if region.is_none() {
        missing.push("STORAGE_S3_REGION");
    }
    if access_key.is_none() {
        missing.push("STORAGE_S3_ACCESS_KEY");
    }
    if secret_key.is_none() {
        missing.push("STORAGE_S3_SECRET_KEY");
    }
    if public_media_url.is_none() {
        missing.push("PUBLIC_MEDIA_URL");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "S3 storage is partially configured; missing: {}",
            missing.join(", ")
        )
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_nothing_configured_is_valid() {
        assert!(validate_storage(&None, &None, &None, &None, &None).is_ok());
    }

    #[test]
    fn test_fully_configured_is_valid() {
        assert!(
            validate_storage(
                &some("bucket"),
                &some("us-east-2"),
                &some("ak"),
                &some("sk"),
                &some("https://media.test"),
            )
            .is_ok()
        );
    }

    #[test]
    fn test_partial_configuration_fails() {
        let err = validate_storage(&some("bucket"), &None, &None, &None, &None).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("STORAGE_S3_REGION"));
        assert!(message.contains("PUBLIC_MEDIA_URL"));
    }

    #[test]
    fn test_missing_public_url_fails() {
        assert!(
            validate_storage(
                &some("bucket"),
                &some("us-east-2"),
                &some("ak"),
                &some("sk"),
                &None,
            )
            .is_err()
        );
    }
}
