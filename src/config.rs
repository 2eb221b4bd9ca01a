/// Limits and post-processing switches for a [`Resolver`](crate::Resolver).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Total number of recursive resolution calls allowed for one token.
    /// Exceeding it turns the whole token into a no-match.
    pub max_steps: usize,
    /// Largest count accepted by the `(<inner>)<n>` group rule.
    pub max_group_repeat: usize,
    /// Largest bare integer that becomes a repeat placeholder.
    pub max_repeat: usize,
    /// Drop explicit hydrogen children in [`Resolver::interpret`](crate::Resolver::interpret).
    pub strip_hydrogens: bool,
    /// Lay out the fragment in [`Resolver::interpret`](crate::Resolver::interpret).
    pub generate_coordinates: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_steps: 10_000,
            max_group_repeat: 9,
            max_repeat: 99,
            strip_hydrogens: true,
            generate_coordinates: true,
        }
    }
}

impl ResolverConfig {
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_max_group_repeat(mut self, max_group_repeat: usize) -> Self {
        self.max_group_repeat = max_group_repeat;
        self
    }

    pub fn with_max_repeat(mut self, max_repeat: usize) -> Self {
        self.max_repeat = max_repeat;
        self
    }

    pub fn with_strip_hydrogens(mut self, strip_hydrogens: bool) -> Self {
        self.strip_hydrogens = strip_hydrogens;
        self
    }

    pub fn with_generate_coordinates(mut self, generate_coordinates: bool) -> Self {
        self.generate_coordinates = generate_coordinates;
        self
    }
}
