// Evaluation of a feed-forward network with encrypted weights using the
// `fhe-handles` crate.
//
// The network has two inputs, two hidden nodes and one output, plus a bias node
// on the input and hidden layers. Every weight is encrypted under CKKS and the
// activation is the square function, so each layer consumes two levels of the
// modulus chain: one for the weighted sum and one for the activation.

use fhe_handles::{
    Ciphertext, CkksEncoder, Context, Decryptor, EncryptionParameters, Encryptor, Evaluator,
    KeyGenerator, RelinKeys, SchemeType,
};
use log::info;
use rand::{thread_rng, Rng};
use std::error::Error;

struct FeedForward {
    encryptor: Encryptor,
    evaluator: Evaluator,
    encoder: CkksEncoder,
    relin_keys: RelinKeys,
    scale: f64,
    // Indexed by source node then destination node, bias node last.
    input_weights: Vec<Vec<Ciphertext>>,
    output_weights: Vec<Vec<Ciphertext>>,
    // The same weights in the clear, to compare against.
    clear_input_weights: Vec<Vec<f64>>,
    clear_output_weights: Vec<Vec<f64>>,
}

impl FeedForward {
    #[allow(clippy::too_many_arguments)]
    fn new(
        encryptor: Encryptor,
        evaluator: Evaluator,
        encoder: CkksEncoder,
        relin_keys: RelinKeys,
        scale: f64,
        inputs: usize,
        hiddens: usize,
        outputs: usize,
    ) -> Result<Self, Box<dyn Error>> {
        let mut rng = thread_rng();
        let clear_input_weights = (0..=inputs)
            .map(|_| (0..hiddens).map(|_| rng.gen_range(-1.0..1.0)).collect())
            .collect::<Vec<Vec<f64>>>();
        let clear_output_weights = (0..=hiddens)
            .map(|_| (0..outputs).map(|_| rng.gen_range(-1.0..1.0)).collect())
            .collect::<Vec<Vec<f64>>>();

        let mut network = Self {
            encryptor,
            evaluator,
            encoder,
            relin_keys,
            scale,
            input_weights: vec![],
            output_weights: vec![],
            clear_input_weights,
            clear_output_weights,
        };
        network.input_weights = network.encrypt_matrix(&network.clear_input_weights)?;
        network.output_weights = network.encrypt_matrix(&network.clear_output_weights)?;
        Ok(network)
    }

    fn encrypt(&self, value: f64) -> Result<Ciphertext, Box<dyn Error>> {
        Ok(self
            .encryptor
            .encrypt(&self.encoder.encode(value, self.scale)?)?)
    }

    fn encrypt_matrix(&self, matrix: &[Vec<f64>]) -> Result<Vec<Vec<Ciphertext>>, Box<dyn Error>> {
        matrix
            .iter()
            .map(|row| row.iter().map(|w| self.encrypt(*w)).collect())
            .collect()
    }

    fn level(ct: &Ciphertext) -> Result<usize, Box<dyn Error>> {
        Ok(ct.level().ok_or("not a CKKS ciphertext")?)
    }

    fn scale_of(ct: &Ciphertext) -> Result<f64, Box<dyn Error>> {
        Ok(ct.scale().ok_or("not a CKKS ciphertext")?)
    }

    /// A copy of `ct` switched down to `level`.
    fn at_level(&self, ct: &Ciphertext, level: usize) -> Result<Ciphertext, Box<dyn Error>> {
        let mut ct = ct.clone();
        while Self::level(&ct)? < level {
            self.evaluator.mod_switch_to_next_inplace(&mut ct)?;
        }
        Ok(ct)
    }

    /// Relinearize and rescale a product.
    fn reduce(&self, ct: &mut Ciphertext) -> Result<(), Box<dyn Error>> {
        self.evaluator.relinearize_inplace(ct, &self.relin_keys)?;
        self.evaluator.rescale_to_next_inplace(ct)?;
        Ok(())
    }

    /// The square activation, applied to a weighted sum.
    fn activate(&self, sum: &mut Ciphertext) -> Result<(), Box<dyn Error>> {
        self.reduce(sum)?;
        self.evaluator.square_inplace(sum)?;
        self.reduce(sum)
    }

    /// Weighted sum of `activations` towards node `node`; the bias node
    /// contributes its weight times one, encoded at the scale of the
    /// activations.
    fn weighted_sum(
        &self,
        activations: &[Ciphertext],
        weights: &[Vec<Ciphertext>],
        node: usize,
    ) -> Result<Ciphertext, Box<dyn Error>> {
        let first = activations.first().ok_or("no activations")?;
        let level = Self::level(first)?;
        let one = self.encoder.encode(1.0, Self::scale_of(first)?)?;

        let mut sum = self.at_level(&weights[activations.len()][node], level)?;
        self.evaluator.multiply_plain_inplace(&mut sum, &one)?;
        for (activation, row) in activations.iter().zip(weights) {
            let mut term = self.at_level(&row[node], level)?;
            self.evaluator.multiply_inplace(&mut term, activation)?;
            self.evaluator.add_inplace(&mut sum, &term)?;
        }
        Ok(sum)
    }

    /// Activate the network on encrypted inputs.
    fn update(&self, inputs: &[Ciphertext]) -> Result<Vec<Ciphertext>, Box<dyn Error>> {
        let hiddens = (0..self.input_weights[0].len())
            .map(|node| {
                let mut sum = self.weighted_sum(inputs, &self.input_weights, node)?;
                self.activate(&mut sum)?;
                Ok(sum)
            })
            .collect::<Result<Vec<_>, Box<dyn Error>>>()?;

        (0..self.output_weights[0].len())
            .map(|node| {
                let mut sum = self.weighted_sum(&hiddens, &self.output_weights, node)?;
                self.activate(&mut sum)?;
                Ok(sum)
            })
            .collect()
    }

    /// The same activation on clear inputs.
    fn update_clear(&self, inputs: &[f64]) -> Vec<f64> {
        let layer = |activations: &[f64], weights: &[Vec<f64>]| -> Vec<f64> {
            (0..weights[0].len())
                .map(|node| {
                    let bias = weights[activations.len()][node];
                    let sum = activations
                        .iter()
                        .zip(weights)
                        .map(|(a, row)| a * row[node])
                        .sum::<f64>()
                        + bias;
                    sum * sum
                })
                .collect()
        };
        let hiddens = layer(inputs, &self.clear_input_weights);
        layer(&hiddens, &self.clear_output_weights)
    }

    /// Half the squared distance between the outputs and the targets.
    fn error(&self, outputs: &[Ciphertext], targets: &[f64]) -> Result<Ciphertext, Box<dyn Error>> {
        let half = self.encoder.encode(0.5, self.scale)?;
        let mut error: Option<Ciphertext> = None;
        for (output, target) in outputs.iter().zip(targets) {
            let mut difference = output.clone();
            let target = self.encoder.encode(*target, Self::scale_of(output)?)?;
            self.evaluator.sub_plain_inplace(&mut difference, &target)?;
            self.evaluator.square_inplace(&mut difference)?;
            self.reduce(&mut difference)?;
            self.evaluator.multiply_plain_inplace(&mut difference, &half)?;
            self.evaluator.rescale_to_next_inplace(&mut difference)?;
            match error.as_mut() {
                Some(error) => self.evaluator.add_inplace(error, &difference)?,
                None => error = Some(difference),
            }
        }
        Ok(error.ok_or("no outputs")?)
    }

    /// Accumulate the error of the network over encrypted patterns.
    fn total_error(
        &self,
        patterns: &[(Vec<Ciphertext>, Vec<f64>)],
    ) -> Result<Ciphertext, Box<dyn Error>> {
        let mut total: Option<Ciphertext> = None;
        for (inputs, targets) in patterns {
            let error = self.error(&self.update(inputs)?, targets)?;
            match total.as_mut() {
                Some(total) => self.evaluator.add_inplace(total, &error)?,
                None => total = Some(error),
            }
        }
        Ok(total.ok_or("no patterns")?)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut parameters = EncryptionParameters::new(SchemeType::Ckks);
    parameters
        .set_poly_modulus_degree(16384)
        .set_coeff_modulus(&[60, 40, 40, 40, 40, 40, 40, 40]);
    let context = Context::new(&parameters)?;
    let keygen = KeyGenerator::new(&context)?;
    let encoder = CkksEncoder::new(&context)?;
    let decryptor = Decryptor::new(&context, &keygen.secret_key())?;
    let decrypt = |ct: &Ciphertext| -> Result<f64, Box<dyn Error>> {
        Ok(encoder.decode(&decryptor.decrypt(ct)?)?)
    };

    let network = FeedForward::new(
        Encryptor::new(&context, &keygen.public_key())?,
        Evaluator::new(&context),
        encoder.clone(),
        keygen.relin_keys(4)?,
        2f64.powi(40),
        2,
        2,
        1,
    )?;
    info!("initialized a 2-2-1 network with encrypted weights");

    // The XOR patterns.
    let clear_patterns = [
        ([0.0, 0.0], [0.0]),
        ([0.0, 1.0], [1.0]),
        ([1.0, 0.0], [1.0]),
        ([1.0, 1.0], [0.0]),
    ];
    let patterns = clear_patterns
        .iter()
        .map(|(inputs, targets)| {
            let inputs = inputs
                .iter()
                .map(|x| network.encrypt(*x))
                .collect::<Result<Vec<_>, _>>()?;
            Ok((inputs, targets.to_vec()))
        })
        .collect::<Result<Vec<_>, Box<dyn Error>>>()?;

    let mut expected_error = 0.0;
    for ((inputs, _), (clear_inputs, targets)) in patterns.iter().zip(&clear_patterns) {
        let outputs = network.update(inputs)?;
        let clear_outputs = network.update_clear(clear_inputs);
        for ((output, expected), target) in outputs.iter().zip(&clear_outputs).zip(targets) {
            info!(
                "{clear_inputs:?} -> {:.6} (in the clear: {expected:.6}, target {target}, level {:?})",
                decrypt(output)?,
                output.level()
            );
            expected_error += 0.5 * (expected - target) * (expected - target);
        }
    }

    let error = network.total_error(&patterns)?;
    info!(
        "error over the patterns: {:.6} (in the clear: {expected_error:.6})",
        decrypt(&error)?
    );
    Ok(())
}
