use super::types::{ProjectionResult, SimulationParameters, YearPoint};

pub fn project(params: &SimulationParameters) -> ProjectionResult {
    let ages: Vec<u32> = (params.current_age..=params.life_expectancy).collect();
    if ages.is_empty() {
        return ProjectionResult { points: Vec::new() };
    }

    let inflation_base = 1.0 + params.inflation_rate;
    let salary_base = 1.0 + params.salary_growth_rate;

    let mut salaries: Vec<f64> = ages
        .iter()
        .map(|&age| params.salary * salary_base.powi(years_from_start(params, age)))
        .collect();
    let mut expenses: Vec<f64> = ages
        .iter()
        .map(|&age| {
            let base = if age <= params.retirement_age {
                params.pre_retirement_expenses
            } else {
                params.post_retirement_expenses
            };
            base * inflation_base.powi(years_from_start(params, age))
        })
        .collect();

    // Real mode deflates the recurring flows to today's money and leaves the
    // one-off amounts as given; nominal mode instead brings each one-off
    // amount forward to the year it occurs. The inflated copy is local to
    // this call.
    let mut extra_expenses = params.extra_expenses.clone();
    if params.adjust_for_inflation {
        for (i, &age) in ages.iter().enumerate() {
            let deflator = inflation_base.powi(years_from_start(params, age));
            salaries[i] /= deflator;
            expenses[i] /= deflator;
        }
    } else {
        for (age, amount) in extra_expenses.iter_mut() {
            *amount *= inflation_base.powi(years_from_start(params, *age));
        }
    }

    let mut corpus = vec![0.0; ages.len()];
    corpus[0] = params.starting_corpus;

    for i in 1..ages.len() {
        let age = ages[i];
        // `age == retirement_age` takes the pre-retirement branch, here and
        // in the cash flow below.
        let growth = if age <= params.retirement_age {
            params.pre_retirement_investment_growth_rate
        } else {
            params.post_retirement_investment_growth_rate
        };

        let mut value = corpus[i - 1] * (1.0 + growth);
        if params.adjust_for_inflation {
            value /= inflation_base;
        }

        if age <= params.retirement_age {
            value += salaries[i] - expenses[i];
        } else {
            value -= expenses[i];
        }

        if let Some(amount) = extra_expenses.get(&age) {
            value -= amount;
        }

        corpus[i] = if value < 0.0 { 0.0 } else { value };
    }

    ProjectionResult {
        points: ages
            .into_iter()
            .zip(corpus)
            .map(|(age, corpus)| YearPoint { age, corpus })
            .collect(),
    }
}

fn years_from_start(params: &SimulationParameters, age: u32) -> i32 {
    age as i32 - params.current_age as i32
}
