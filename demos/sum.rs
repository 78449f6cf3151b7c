use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use snn::Network;

/// Learns `a + b + c` for digits 0-9 with a linear 3-10-1 network.
fn main() -> snn::Result<()> {
    let mut rng = ChaCha12Rng::seed_from_u64(7);
    let mut network = Network::from_short("3;10;1", &mut rng)?;

    for i in 0..200_000 {
        let input: Vec<f64> = (0..3).map(|_| rng.gen_range(0..10) as f64).collect();
        let expected = [input.iter().sum::<f64>()];
        let output = network.process(&input, &expected, 0.0001);
        if i % 20_000 == 0 {
            println!(
                "{:>6}: expected {} got {:.4} (diff {:.4})",
                i,
                expected[0],
                output[0],
                (output[0] - expected[0]).abs()
            );
        }
    }
    Ok(())
}
