// ==========================================
// 债务导入服务 - 债务人导入
// ==========================================
// 必填: iin
// 一行可带出: 债务 / 地址 / 电话 / 联系人电话
// 红线: 子实体写入失败只作为本行警告，债务人已写入即为 done
// ==========================================

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::audit::AuditLedger;
use crate::domain::{
    AddressUpsert, ContactPhoneEntry, DebtUpsert, DebtorUpsert, ModelType, PhoneUpsert, Row,
    ADDRESS_COLUMNS, PHONE_COLUMNS,
};
use crate::importer::processor_trait::Processor;
use crate::importer::run_context::ImportRun;
use crate::processors::error::ProcessorResult;
use crate::processors::helpers::{
    json_or_empty, parse_float_loose, parse_person_date, split_full_name, split_phones,
};
use crate::processors::row_pipeline::{drive_rows, RowHandler, RowOutcome};
use crate::processors::stores::Stores;

pub const IMPORT_TYPE: &str = "import_debtors";

pub const EXPECTED_COLUMNS: &[&str] = &[
    "iin",
    "full_name",
    "status",
    "id_card_number",
    "id_card_authorities_in_granting",
    "id_card_start_date",
    "id_card_end_date",
    "birth_day",
    "birthplace",
    "nationality",
    "debt_number",
    "start_date",
    "end_date",
    "filial",
    "product_name",
    "currency",
    "amount_actual_debt",
    "amount_credit",
    "amount_main_debt",
    "amount_fine",
    "additional_data",
    "reg_address",
    "fact_address",
    "work_address",
    "phones",
    "work_phones",
    "home_phones",
    "contact_person_phones",
];

pub struct DebtorsProcessor {
    stores: Arc<Stores>,
    ledger: Arc<dyn AuditLedger>,
}

impl DebtorsProcessor {
    pub fn new(stores: Arc<Stores>, ledger: Arc<dyn AuditLedger>) -> Self {
        Self { stores, ledger }
    }

    fn debtor_from_row(iin: &str, row: &Row) -> DebtorUpsert {
        let (last_name, first_name, middle_name) = split_full_name(row.get("full_name"));
        DebtorUpsert {
            iin: iin.to_string(),
            last_name,
            first_name,
            middle_name,
            status: row.get("status").to_string(),
            id_card_number: row.get("id_card_number").to_string(),
            id_card_authorities_in_granting: row.get("id_card_authorities_in_granting").to_string(),
            id_card_start_date: parse_person_date(row.get("id_card_start_date")),
            id_card_end_date: parse_person_date(row.get("id_card_end_date")),
            birth_day: parse_person_date(row.get("birth_day")),
            birthplace: row.get("birthplace").to_string(),
            nationality: row.get("nationality").to_string(),
        }
    }

    fn upsert_debt(&self, debtor_id: &str, row: &Row, warnings: &mut Vec<String>) {
        let number = row.get("debt_number");
        if number.is_empty() {
            return;
        }
        let debt = DebtUpsert {
            id: Uuid::new_v4().to_string(),
            debtor_id: Some(debtor_id.to_string()),
            number: number.to_string(),
            start_date: parse_person_date(row.get("start_date")),
            end_date: parse_person_date(row.get("end_date")),
            filial: row.get("filial").to_string(),
            product_name: row.get("product_name").to_string(),
            currency: row.get("currency").to_string(),
            amount_actual_debt: parse_float_loose(row.get("amount_actual_debt")),
            amount_credit: parse_float_loose(row.get("amount_credit")),
            amount_main_debt: parse_float_loose(row.get("amount_main_debt")),
            amount_fine: parse_float_loose(row.get("amount_fine")),
            additional_data: json_or_empty(row.get("additional_data")),
        };
        if let Err(e) = self.stores.debts.upsert_debt(&debt) {
            warnings.push(format!("debt {}: {}", number, e));
        }
    }

    fn upsert_addresses(&self, debtor_id: &str, row: &Row, warnings: &mut Vec<String>) {
        for (column, type_id) in ADDRESS_COLUMNS {
            let address = row.get(column);
            if address.is_empty() {
                continue;
            }
            let upsert = AddressUpsert {
                subject_type: ModelType::Debtor.class_name().to_string(),
                subject_id: debtor_id.to_string(),
                address: address.to_string(),
                type_id,
            };
            if let Err(e) = self.stores.debtors.upsert_address(&upsert) {
                warnings.push(format!("{}: {}", column, e));
            }
        }
    }

    fn upsert_phones(&self, debtor_id: &str, row: &Row, warnings: &mut Vec<String>) {
        for (column, type_id) in PHONE_COLUMNS {
            for phone in split_phones(row.get(column)) {
                let upsert = PhoneUpsert {
                    subject_type: ModelType::Debtor.class_name().to_string(),
                    subject_id: debtor_id.to_string(),
                    phone,
                    type_id,
                };
                if let Err(e) = self.stores.debtors.upsert_phone(&upsert) {
                    warnings.push(format!("{}: {}", column, e));
                }
            }
        }
    }

    fn upsert_contact_phones(&self, debtor_id: &str, row: &Row, warnings: &mut Vec<String>) {
        for entry in ContactPhoneEntry::parse_list(row.get("contact_person_phones")) {
            let contact_id = match self.stores.debtors.upsert_contact_person(
                debtor_id,
                &entry.full_name,
                entry.type_id,
            ) {
                Ok(id) => id,
                Err(e) => {
                    warnings.push(format!("contact_person_phones: {}", e));
                    continue;
                }
            };
            let upsert = PhoneUpsert {
                subject_type: ModelType::ContactPerson.class_name().to_string(),
                subject_id: contact_id,
                phone: entry.phone,
                type_id: entry.type_id,
            };
            if let Err(e) = self.stores.debtors.upsert_phone(&upsert) {
                warnings.push(format!("contact_person_phones: {}", e));
            }
        }
    }
}

impl RowHandler for DebtorsProcessor {
    fn model_type(&self) -> ModelType {
        ModelType::Debtor
    }

    fn handle_row(&self, _run: &mut ImportRun, row: &Row) -> ProcessorResult<RowOutcome> {
        let iin = row.get("iin");
        if iin.is_empty() {
            return Ok(RowOutcome::failed("missing iin"));
        }

        let debtor = Self::debtor_from_row(iin, row);
        let debtor_id = match self.stores.debtors.upsert_debtor(&debtor) {
            Ok(id) => id,
            Err(e) => return Ok(RowOutcome::failed(e.to_string())),
        };

        let mut warnings = Vec::new();
        self.upsert_debt(&debtor_id, row, &mut warnings);
        self.upsert_addresses(&debtor_id, row, &mut warnings);
        self.upsert_phones(&debtor_id, row, &mut warnings);
        self.upsert_contact_phones(&debtor_id, row, &mut warnings);

        Ok(RowOutcome::done_with(debtor_id, warnings))
    }
}

#[async_trait]
impl Processor for DebtorsProcessor {
    fn import_type(&self) -> &'static str {
        IMPORT_TYPE
    }

    fn expected_columns(&self) -> &'static [&'static str] {
        EXPECTED_COLUMNS
    }

    async fn process_batch(&self, run: &mut ImportRun, batch: &[Row]) -> ProcessorResult<()> {
        drive_rows(self, self.ledger.as_ref(), run, batch).await
    }
}
