pub mod attention_rnn;
