use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use snn::Network;

fn main() -> snn::Result<()> {
    let mut rng = ChaCha12Rng::seed_from_u64(42);
    let mut network = Network::from_short("2;4,Sigmoid;1,Sigmoid", &mut rng)?;

    let inputs = vec![
        vec![1.0, 0.0],
        vec![1.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0],
    ];
    let expected_outputs = vec![
        vec![1.0],
        vec![0.0],
        vec![1.0],
        vec![0.0],
    ];

    let epochs = 20000;
    for epoch in 0..epochs {
        let mut loss = 0.0;
        for (input, expected) in inputs.iter().zip(&expected_outputs) {
            let output = network.process(input, expected, 0.5);
            loss += (output[0] - expected[0]).powi(2);
        }
        if epoch % 2000 == 0 {
            println!("Epoch {epoch}: loss = {:.6}", loss / inputs.len() as f64);
        }
    }

    for input in &inputs {
        println!("Input: {:?} -> Output: {:.4}", input, network.predict(input)[0]);
    }

    network.store("xor.snn")?;
    println!("stored to xor.snn");
    Ok(())
}
