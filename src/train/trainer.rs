use crate::network::network::Network;

/// Mean of `(predicted - expected)²`; missing expected entries count as 0.
pub fn mean_squared_error(predicted: &[f64], expected: &[f64]) -> f64 {
    if predicted.is_empty() {
        return 0.0;
    }
    let sum: f64 = predicted
        .iter()
        .enumerate()
        .map(|(i, p)| (p - expected.get(i).copied().unwrap_or(0.0)).powi(2))
        .sum();
    sum / predicted.len() as f64
}

/// One online pass over `order`: every sample is a single `process` call and
/// updates the weights immediately. Returns the mean loss of the pre-update
/// outputs.
pub fn train_network(
    network: &mut Network,
    inputs: &[Vec<f64>],
    expected_outputs: &[Vec<f64>],
    order: &[usize],
    epsilon: f64,
) -> f64 {
    if order.is_empty() {
        return 0.0;
    }

    let mut total_loss = 0.0;
    for &i in order {
        let expected = &expected_outputs[i];
        let output = network.process(&inputs[i], expected, epsilon);
        total_loss += mean_squared_error(&output, expected);
    }

    total_loss / order.len() as f64
}
