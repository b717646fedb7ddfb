use raceline_sim::{HumanPolicy, LearnedPolicy, PolicyProvider};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::input::HeldKeys;
use crate::network::FeedForwardNet;

/// How each generation's entrants are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationSpec {
    pub seed: u64,
    pub size: usize,
    pub hidden: usize,
    pub baseline: bool,
}

impl PopulationSpec {
    /// Entrants per generation, baseline included.
    pub fn entrants(&self) -> usize {
        self.size + usize::from(self.baseline)
    }
}

/// RNG for one generation: one ChaCha stream per generation index.
pub fn generation_rng(seed: u64, generation: u64) -> ChaCha20Rng {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    rng.set_stream(generation);
    rng
}

/// Build the entrants for `generation`. Networks come first, the optional
/// baseline last. Equal inputs always yield the same entrants.
pub fn build_population(spec: &PopulationSpec, generation: u64) -> Vec<Box<dyn PolicyProvider>> {
    let mut rng = generation_rng(spec.seed, generation);
    let mut policies: Vec<Box<dyn PolicyProvider>> = Vec::with_capacity(spec.entrants());
    let mut parameters = 0;
    for index in 0..spec.size {
        let net = FeedForwardNet::random(spec.hidden, &mut rng);
        parameters = net.parameter_count();
        policies.push(Box::new(LearnedPolicy::new(format!("net-{generation}-{index}"), net)));
    }
    if spec.baseline {
        policies.push(Box::new(HumanPolicy::new(HeldKeys::accelerate())));
    }
    log::debug!(
        "generation {generation}: built {} entrants, {parameters} weights per network",
        policies.len()
    );
    policies
}
