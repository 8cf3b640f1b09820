use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone)]
pub struct SimulationParameters {
    pub starting_corpus: f64,
    pub salary: f64,
    pub salary_growth_rate: f64,
    pub pre_retirement_investment_growth_rate: f64,
    pub post_retirement_investment_growth_rate: f64,
    pub inflation_rate: f64,
    pub pre_retirement_expenses: f64,
    pub post_retirement_expenses: f64,
    pub retirement_age: u32,
    pub current_age: u32,
    pub life_expectancy: u32,
    pub extra_expenses: BTreeMap<u32, f64>,
    pub adjust_for_inflation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearPoint {
    pub age: u32,
    pub corpus: f64,
}

#[derive(Debug, Clone)]
pub struct ProjectionResult {
    pub points: Vec<YearPoint>,
}

impl ProjectionResult {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn final_corpus(&self) -> Option<f64> {
        self.points.last().map(|point| point.corpus)
    }
}
