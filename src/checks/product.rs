//! Product installation snapshots under `enterprise/find`.

use std::collections::HashSet;

use super::{claim_unique, file_name_of, Action, Check};
use crate::config::DiagConfig;
use crate::layout::Category::EnterpriseFind;

pub fn register(config: &DiagConfig, checks: &mut Vec<Check>) {
    let product = &config.product;

    if let Some(home) = &product.home {
        checks.push(Check::new(
            "product-find",
            EnterpriseFind,
            "find.txt",
            Action::FindListing {
                root: home.clone(),
                max_depth: product.find_max_depth,
            },
        ));
    }

    // find.txt is taken by the listing above
    let mut used: HashSet<String> = HashSet::from([String::from("find.txt")]);
    for (index, path) in product.config_files.iter().enumerate() {
        let base = file_name_of(path).unwrap_or_else(|| format!("config{}", index));
        let output = claim_unique(&mut used, base.clone(), |n| format!("{}.{}", base, index + n));

        checks.push(Check::new(
            format!("product-config-{}", index),
            EnterpriseFind,
            output,
            Action::CopyFile(path.clone()),
        ));
    }
}
