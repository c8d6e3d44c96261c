//! Module registry backed by the `modules` list in the settings

use std::collections::BTreeMap;

use crate::config::ModuleConfig;
use crate::domain::ModuleInfo;
use crate::infrastructure::traits::ModuleRegistry;

/// Fixed set of modules known at startup.
#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
    modules: BTreeMap<String, ModuleInfo>,
}

impl ModuleCatalog {
    pub fn new(modules: impl IntoIterator<Item = ModuleInfo>) -> Self {
        Self {
            modules: modules
                .into_iter()
                .map(|module| (module.name.clone(), module))
                .collect(),
        }
    }

    pub fn from_config(modules: &[ModuleConfig]) -> Self {
        Self::new(modules.iter().map(|m| {
            ModuleInfo::new(m.name.clone(), m.module_type).with_description(m.description.clone())
        }))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleRegistry for ModuleCatalog {
    fn find_module_by_name(&self, name: &str) -> Option<ModuleInfo> {
        self.modules.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModuleType;

    #[test]
    fn finds_configured_modules_by_exact_name() {
        let catalog = ModuleCatalog::from_config(&[ModuleConfig {
            name: "KJV".into(),
            module_type: ModuleType::Bible,
            description: "King James Version".into(),
        }]);

        let kjv = catalog.find_module_by_name("KJV").unwrap();
        assert_eq!(kjv.module_type, ModuleType::Bible);
        assert_eq!(kjv.description, "King James Version");
        assert!(catalog.find_module_by_name("kjv").is_none());
    }
}
