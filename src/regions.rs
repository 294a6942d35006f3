/// Regions offered when picking where to browse parameters.
pub const KNOWN_REGIONS: &[&str] = &[
    // US
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    // Africa
    "af-south-1",
    // Asia Pacific
    "ap-east-1",
    "ap-south-1",
    "ap-south-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-southeast-3",
    "ap-southeast-4",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    // Canada
    "ca-central-1",
    // China
    "cn-north-1",
    "cn-northwest-1",
    // Europe
    "eu-central-1",
    "eu-central-2",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-north-1",
    "eu-south-1",
    "eu-south-2",
    // Middle East
    "me-south-1",
    "me-central-1",
    "il-central-1",
    // South America
    "sa-east-1",
    // GovCloud
    "us-gov-east-1",
    "us-gov-west-1",
];

pub fn is_known_region(region: &str) -> bool {
    KNOWN_REGIONS.contains(&region)
}
