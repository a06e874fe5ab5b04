//! Built-in provider catalog.

use crate::provider::{Capability, Provider, ProviderCategory};

/// Return the providers every registry built with
/// [`ProviderRegistry::builtin`](crate::ProviderRegistry::builtin) starts with.
pub fn builtin_providers() -> Vec<Provider> {
    use ProviderCategory::{Calendar, CallIntelligence, Communication, Crm, Enablement, StorageAndWiki};

    vec![
        Provider::new("gong", "Gong", CallIntelligence)
            .with_description("Call recordings and conversation intelligence"),
        Provider::new("chorus", "Chorus", CallIntelligence)
            .with_description("Call recordings from ZoomInfo Chorus"),
        Provider::new("google-calendar", "Google Calendar", Calendar)
            .with_description("Meetings from Google Workspace calendars"),
        Provider::new("outlook-calendar", "Outlook Calendar", Calendar)
            .with_description("Meetings from Microsoft 365 calendars"),
        Provider::new("salesforce", "Salesforce", Crm)
            .with_capability(Capability::Write)
            .with_description("Accounts, opportunities and deal stages"),
        Provider::new("hubspot", "HubSpot", Crm)
            .with_capability(Capability::Write)
            .with_description("Companies, deals and pipelines"),
        Provider::new("slack", "Slack", Communication)
            .with_capability(Capability::Write)
            .with_description("Channel conversations"),
        Provider::new("microsoft-teams", "Microsoft Teams", Communication)
            .with_capability(Capability::Write)
            .with_description("Team channels and chats"),
        Provider::new("confluence", "Confluence", StorageAndWiki)
            .with_description("Wiki spaces and pages"),
        Provider::new("notion", "Notion", StorageAndWiki)
            .with_description("Workspace pages and databases"),
        Provider::new("google-drive", "Google Drive", StorageAndWiki)
            .with_description("Docs, slides and shared drives"),
        Provider::new("highspot", "Highspot", Enablement)
            .with_description("Sales enablement content"),
        Provider::new("seismic", "Seismic", Enablement)
            .with_description("Sales enablement content"),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn ids_are_unique() {
        let providers = builtin_providers();
        let ids: BTreeSet<&str> = providers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), providers.len());
    }

    #[test]
    fn every_category_is_represented() {
        let providers = builtin_providers();
        for category in ProviderCategory::ALL {
            assert!(
                providers.iter().any(|p| p.category == category),
                "no built-in provider for {category}"
            );
        }
    }
}
