mod chunking_scenarios;
mod rag_ranking;
