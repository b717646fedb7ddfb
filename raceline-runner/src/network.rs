//! Small feed-forward network used as a stand-in decision function.
use raceline_sim::{ACTION_SIZE, DecisionFunction, OBSERVATION_SIZE};
use rand::Rng;

/// Rough magnitude of each observation channel: speed, steering, five sensors.
const INPUT_SCALE: [f64; OBSERVATION_SIZE] = [40.0, 0.75, 250.0, 250.0, 250.0, 250.0, 250.0];

/// Seven inputs, one tanh hidden layer, two tanh outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedForwardNet {
    hidden: usize,
    input_weights: Vec<f64>,
    hidden_bias: Vec<f64>,
    output_weights: Vec<f64>,
    output_bias: [f64; ACTION_SIZE],
}

impl FeedForwardNet {
    /// Draw every weight and bias uniformly from `[-1, 1]`.
    pub fn random<R: Rng + ?Sized>(hidden: usize, rng: &mut R) -> Self {
        let input_weights = uniform(rng, hidden * OBSERVATION_SIZE);
        let hidden_bias = uniform(rng, hidden);
        let output_weights = uniform(rng, ACTION_SIZE * hidden);
        let mut output_bias = [0.0; ACTION_SIZE];
        for bias in &mut output_bias {
            *bias = rng.gen_range(-1.0..=1.0);
        }
        Self {
            hidden,
            input_weights,
            hidden_bias,
            output_weights,
            output_bias,
        }
    }

    pub fn parameter_count(&self) -> usize {
        self.input_weights.len()
            + self.hidden_bias.len()
            + self.output_weights.len()
            + self.output_bias.len()
    }

    fn forward(&self, inputs: &[f64; OBSERVATION_SIZE]) -> [f64; ACTION_SIZE] {
        let mut scaled = [0.0; OBSERVATION_SIZE];
        for ((out, value), scale) in scaled.iter_mut().zip(inputs).zip(INPUT_SCALE) {
            *out = value / scale;
        }

        let activations: Vec<f64> = self
            .input_weights
            .chunks_exact(OBSERVATION_SIZE)
            .zip(&self.hidden_bias)
            .map(|(row, bias)| dot(row, &scaled, *bias).tanh())
            .collect();

        let mut outputs = self.output_bias;
        if self.hidden > 0 {
            let rows = self.output_weights.chunks_exact(self.hidden);
            for (out, row) in outputs.iter_mut().zip(rows) {
                *out = dot(row, &activations, *out);
            }
        }
        outputs.map(f64::tanh)
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<f64> {
    (0..count).map(|_| rng.gen_range(-1.0..=1.0)).collect()
}

fn dot(weights: &[f64], values: &[f64], bias: f64) -> f64 {
    weights
        .iter()
        .zip(values)
        .fold(bias, |acc, (w, v)| w.mul_add(*v, acc))
}

impl DecisionFunction for FeedForwardNet {
    fn activate(&mut self, inputs: &[f64; OBSERVATION_SIZE]) -> [f64; ACTION_SIZE] {
        self.forward(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const SAMPLE: [f64; OBSERVATION_SIZE] = [22.0, -0.3, 120.0, 80.0, 300.0, 45.0, 10.0];

    #[test]
    fn parameter_count_matches_shape() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let net = FeedForwardNet::random(6, &mut rng);
        assert_eq!(net.hidden, 6);
        assert_eq!(net.parameter_count(), 6 * 7 + 6 + 2 * 6 + 2);
    }

    #[test]
    fn outputs_stay_in_tanh_range() {
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        for hidden in [1, 4, 16] {
            let mut net = FeedForwardNet::random(hidden, &mut rng);
            let out = net.activate(&SAMPLE);
            let bounded = out.iter().all(|v| v.is_finite() && v.abs() <= 1.0);
            assert!(bounded, "{out:?}");
        }
    }

    #[test]
    fn same_seed_builds_same_network() {
        let a = FeedForwardNet::random(5, &mut ChaCha20Rng::seed_from_u64(77));
        let b = FeedForwardNet::random(5, &mut ChaCha20Rng::seed_from_u64(77));
        let c = FeedForwardNet::random(5, &mut ChaCha20Rng::seed_from_u64(78));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn zero_hidden_units_pass_bias_through() {
        let mut net = FeedForwardNet::random(0, &mut ChaCha20Rng::seed_from_u64(3));
        let expected = net.output_bias.map(f64::tanh);
        assert_eq!(net.activate(&SAMPLE), expected);
    }
}
