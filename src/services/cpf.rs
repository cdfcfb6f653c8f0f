// src/services/cpf.rs

// Validação de CPF pelos dois dígitos verificadores. Função pura,
// sem exceções: qualquer entrada estranha simplesmente retorna false.
pub fn is_valid_cpf(raw: &str) -> bool {
    let digits: Vec<u32> = raw.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != 11 {
        return false;
    }

    // Sequências com todos os dígitos iguais ("000...", "111...") passam
    // na conta dos verificadores mas são CPFs conhecidamente inválidos.
    if digits.iter().all(|&d| d == digits[0]) {
        return false;
    }

    // Primeiro verificador: pesos 10..2 sobre os 9 primeiros dígitos.
    let sum: u32 = digits[..9]
        .iter()
        .zip((2..=10).rev())
        .map(|(&d, w)| d * w)
        .sum();
    if (sum * 10) % 11 % 10 != digits[9] {
        return false;
    }

    // Segundo verificador: pesos 11..2 sobre os 10 primeiros.
    let sum: u32 = digits[..10]
        .iter()
        .zip((2..=11).rev())
        .map(|(&d, w)| d * w)
        .sum();
    (sum * 10) % 11 % 10 == digits[10]
}
