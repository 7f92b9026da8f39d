use viewport_protocol::{Breakpoint, BreakpointThresholds, BreakpointTier};

/// Classify a window width: the widest tier whose minimum width is at most
/// `width`. Falls back to the narrowest tier.
pub fn classify(width: u32, thresholds: &BreakpointThresholds) -> BreakpointTier {
    BreakpointTier::ALL
        .into_iter()
        .rev()
        .find(|tier| thresholds.min_width(*tier) <= width)
        .unwrap_or(BreakpointTier::Xs)
}

/// Whether `candidate` holds when the viewport is at `reference`.
///
/// Total over every candidate. A `reference` that is not a real tier only
/// satisfies `Always`.
pub fn is_within(candidate: Breakpoint, reference: Breakpoint) -> bool {
    use Breakpoint as B;
    use BreakpointTier as T;

    let at_most = |tier: T| reference.tier().is_some_and(|r| r <= tier);
    let at_least = |tier: T| reference.tier().is_some_and(|r| r >= tier);

    match candidate {
        B::None => false,
        B::Always => true,
        B::Xs | B::Sm | B::Md | B::Lg | B::Xl | B::Xxl => reference == candidate,
        B::SmAndDown => at_most(T::Sm),
        B::MdAndDown => at_most(T::Md),
        B::LgAndDown => at_most(T::Lg),
        B::XlAndDown => at_most(T::Xl),
        B::SmAndUp => at_least(T::Sm),
        B::MdAndUp => at_least(T::Md),
        B::LgAndUp => at_least(T::Lg),
        B::XlAndUp => at_least(T::Xl),
    }
}
