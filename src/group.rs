use crate::domain::{AgeBin, GroupKey, RegionPolicy};

#[derive(Debug, Clone, Copy, Default)]
pub struct GroupKeyBuilder {
    policy: RegionPolicy,
}

impl GroupKeyBuilder {
    pub fn new(policy: RegionPolicy) -> Self {
        Self { policy }
    }

    pub fn build(&self, region: &str, bin: AgeBin) -> GroupKey {
        let region = match self.policy {
            RegionPolicy::Trim => region.trim(),
            RegionPolicy::Verbatim => region,
        };
        GroupKey::new(region.to_string(), bin)
    }
}
