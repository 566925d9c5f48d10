//! Reactant and product bookkeeping of a reaction mechanism.
//!
//! Every reaction keeps two forms of its stoichiometry: the real-valued coefficients, used for
//! reaction deltas and production rates, and a list of species indices repeated once per
//! unit of stoichiometric coefficient, used to build concentration products by repeated
//! multiplication. The two forms agree only for integral coefficients, which is why
//! `InterfaceKinetics::add_reaction` rejects any other. Here a non-integral coefficient
//! smaller than one still contributes one entry.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionStoich {
    /// (species, coefficient) pairs
    pub reactants: Vec<(usize, f64)>,
    pub products: Vec<(usize, f64)>,
    /// species index repeated per unit of coefficient
    pub reactant_list: Vec<usize>,
    pub product_list: Vec<usize>,
    pub reversible: bool,
}

fn repeated(species: &[(usize, f64)]) -> Vec<usize> {
    let mut list = Vec::new();
    for &(k, nu) in species {
        let mut n = nu.trunc() as usize;
        if (n as f64) != nu && n < 1 {
            n = 1;
        }
        for _ in 0..n {
            list.push(k);
        }
    }
    list
}

#[derive(Debug, Clone, Default)]
pub struct StoichManager {
    pub reactions: Vec<ReactionStoich>,
}

impl StoichManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_reactions(&self) -> usize {
        self.reactions.len()
    }
    /// appends reaction `rxn`; reactions must be added in index order
    pub fn add(
        &mut self,
        rxn: usize,
        reactants: &[(usize, f64)],
        products: &[(usize, f64)],
        reversible: bool,
    ) {
        debug_assert_eq!(rxn, self.reactions.len());
        self.reactions.push(ReactionStoich {
            reactants: reactants.to_vec(),
            products: products.to_vec(),
            reactant_list: repeated(reactants),
            product_list: repeated(products),
            reversible,
        });
    }

    pub fn reactants(&self, rxn: usize) -> &[usize] {
        &self.reactions[rxn].reactant_list
    }

    pub fn products(&self, rxn: usize) -> &[usize] {
        &self.reactions[rxn].product_list
    }

    pub fn reactant_stoich_coeff(&self, k: usize, rxn: usize) -> f64 {
        self.reactions[rxn]
            .reactants
            .iter()
            .filter(|(s, _)| *s == k)
            .map(|(_, nu)| nu)
            .sum()
    }

    pub fn product_stoich_coeff(&self, k: usize, rxn: usize) -> f64 {
        self.reactions[rxn]
            .products
            .iter()
            .filter(|(s, _)| *s == k)
            .map(|(_, nu)| nu)
            .sum()
    }
    /// out[i] *= prod over reactants of conc[k]
    pub fn multiply_reactants(&self, conc: &[f64], out: &mut [f64]) {
        for (i, r) in self.reactions.iter().enumerate() {
            for &k in &r.reactant_list {
                out[i] *= conc[k];
            }
        }
    }
    /// out[i] *= prod over products of conc[k], reversible reactions only
    pub fn multiply_rev_products(&self, conc: &[f64], out: &mut [f64]) {
        for (i, r) in self.reactions.iter().enumerate() {
            if r.reversible {
                for &k in &r.product_list {
                    out[i] *= conc[k];
                }
            }
        }
    }

    fn delta(r: &ReactionStoich, values: &[f64]) -> f64 {
        let p: f64 = r.products.iter().map(|&(k, nu)| nu * values[k]).sum();
        let s: f64 = r.reactants.iter().map(|&(k, nu)| nu * values[k]).sum();
        p - s
    }
    /// products minus reactants of a per species property
    pub fn get_reaction_delta(&self, values: &[f64], out: &mut [f64]) {
        for (i, r) in self.reactions.iter().enumerate() {
            out[i] = Self::delta(r, values);
        }
    }
    /// same as `get_reaction_delta` but only reversible reactions are written
    pub fn get_rev_reaction_delta(&self, values: &[f64], out: &mut [f64]) {
        for (i, r) in self.reactions.iter().enumerate() {
            if r.reversible {
                out[i] = Self::delta(r, values);
            }
        }
    }

    pub fn get_creation_rates(&self, nsp: usize, ropf: &[f64], ropr: &[f64]) -> Vec<f64> {
        let mut cdot = vec![0.0; nsp];
        for (i, r) in self.reactions.iter().enumerate() {
            for &(k, nu) in &r.products {
                cdot[k] += nu * ropf[i];
            }
            if r.reversible {
                for &(k, nu) in &r.reactants {
                    cdot[k] += nu * ropr[i];
                }
            }
        }
        cdot
    }

    pub fn get_destruction_rates(&self, nsp: usize, ropf: &[f64], ropr: &[f64]) -> Vec<f64> {
        let mut ddot = vec![0.0; nsp];
        for (i, r) in self.reactions.iter().enumerate() {
            for &(k, nu) in &r.reactants {
                ddot[k] += nu * ropf[i];
            }
            if r.reversible {
                for &(k, nu) in &r.products {
                    ddot[k] += nu * ropr[i];
                }
            }
        }
        ddot
    }

    pub fn get_net_production_rates(&self, nsp: usize, ropnet: &[f64]) -> Vec<f64> {
        let mut wdot = vec![0.0; nsp];
        for (i, r) in self.reactions.iter().enumerate() {
            for &(k, nu) in &r.products {
                wdot[k] += nu * ropnet[i];
            }
            for &(k, nu) in &r.reactants {
                wdot[k] -= nu * ropnet[i];
            }
        }
        wdot
    }
}
