use crate::{AccessContext, AccessError, Capability, HighlightStatus};

/// Kinds of media a player or match can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Highlight,
    FullMatch,
}

impl ContentKind {
    pub const fn capability(self) -> Capability {
        match self {
            ContentKind::Highlight => Capability::ViewHighlights,
            ContentKind::FullMatch => Capability::ViewFullMatch,
        }
    }
}

/// Keeps approved highlights, item by item. Never gated by tier.
pub fn visible_highlights<T, F>(items: Vec<T>, status: F) -> Vec<T>
where
    F: Fn(&T) -> HighlightStatus,
{
    items
        .into_iter()
        .filter(|item| status(item).is_public())
        .collect()
}

/// Full-match listings are all or nothing for the whole response.
pub fn authorize_full_match_listing(context: &AccessContext) -> Result<(), AccessError> {
    context.check(ContentKind::FullMatch.capability())
}

/// Re-checks the gate right before a stream URL is produced.
///
/// A missing asset is reported before any tier requirement.
pub fn authorize_stream<T>(
    context: &AccessContext,
    asset: Option<T>,
    kind: ContentKind,
    resource: &'static str,
) -> Result<T, AccessError> {
    let asset = asset.ok_or(AccessError::NotFound(resource))?;

    context.check(kind.capability())?;

    Ok(asset)
}

/// Paywall flag shown next to a match on public pages.
pub fn full_match_locked(context: &AccessContext) -> bool {
    !context.allows(ContentKind::FullMatch.capability())
}
