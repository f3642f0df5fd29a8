//! Mode presets
//!
//! A preset only fills settings the operator left unset. It is applied to
//! a copy of the options after validation, so explicit values always win.

use crate::options::InstallOptions;

/// Settings a preset may supply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub controller_replicas: Option<u32>,
    pub controller_cpu_request: Option<&'static str>,
    pub controller_memory_request: Option<&'static str>,
    pub proxy_cpu_request: Option<&'static str>,
    pub proxy_memory_request: Option<&'static str>,
}

impl Preset {
    /// Replicated controllers with resource requests on every component
    pub fn high_availability() -> Self {
        Self {
            name: "high-availability",
            controller_replicas: Some(3),
            controller_cpu_request: Some("100m"),
            controller_memory_request: Some("50Mi"),
            proxy_cpu_request: Some("100m"),
            proxy_memory_request: Some("20Mi"),
        }
    }

    /// Presets selected by the options, in application order
    pub fn selected(options: &InstallOptions) -> Vec<Self> {
        let mut presets = Vec::new();
        if options.high_availability {
            presets.push(Self::high_availability());
        }
        presets
    }

    /// Fill unset options from this preset
    pub fn apply(&self, options: &mut InstallOptions) {
        tracing::debug!(preset = self.name, "applying preset");

        fill(&mut options.controller_replicas, self.controller_replicas);
        fill_str(
            &mut options.controller_cpu_request,
            self.controller_cpu_request,
        );
        fill_str(
            &mut options.controller_memory_request,
            self.controller_memory_request,
        );
        fill_str(&mut options.proxy.cpu_request, self.proxy_cpu_request);
        fill_str(&mut options.proxy.memory_request, self.proxy_memory_request);
    }
}

fn fill<T>(slot: &mut Option<T>, preset: Option<T>) {
    if slot.is_none() {
        *slot = preset;
    }
}

fn fill_str(slot: &mut Option<String>, preset: Option<&str>) {
    fill(slot, preset.map(str::to_string));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_fills_gaps() {
        let mut options = InstallOptions::new();
        Preset::high_availability().apply(&mut options);

        assert_eq!(options.controller_replicas, Some(3));
        assert_eq!(options.controller_cpu_request.as_deref(), Some("100m"));
        assert_eq!(options.proxy.cpu_request.as_deref(), Some("100m"));
        assert_eq!(options.proxy.memory_request.as_deref(), Some("20Mi"));
    }

    #[test]
    fn test_preset_never_overrides_explicit_values() {
        let mut options = InstallOptions::new();
        options.controller_replicas = Some(2);
        options.proxy.cpu_request = Some("400m".to_string());
        options.proxy.memory_request = Some("300Mi".to_string());

        Preset::high_availability().apply(&mut options);

        assert_eq!(options.controller_replicas, Some(2));
        assert_eq!(options.proxy.cpu_request.as_deref(), Some("400m"));
        assert_eq!(options.proxy.memory_request.as_deref(), Some("300Mi"));
        assert_eq!(options.controller_memory_request.as_deref(), Some("50Mi"));
    }

    #[test]
    fn test_selected_presets() {
        let mut options = InstallOptions::new();
        assert!(Preset::selected(&options).is_empty());

        options.high_availability = true;
        assert_eq!(
            Preset::selected(&options),
            vec![Preset::high_availability()]
        );
    }
}
